//! Multipart parsing for driver signup. The whole form is read and checked here, before
//! anything is stored or registered.

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::store::LicenseUpload;

pub const LICENSE_IMAGE_FIELD: &str = "licenseImage";

#[derive(Debug)]
pub struct DriverSignupForm {
    pub name: String,
    pub phone: String,
    pub password: String,
    pub vehicle_number: String,
    pub driving_license: String,
    pub location: GeoPoint,
    pub license_image: LicenseUpload,
}

pub async fn read_driver_signup(mut multipart: Multipart) -> Result<DriverSignupForm, AppError> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut license_image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(err.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == LICENSE_IMAGE_FIELD {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|err| AppError::BadRequest(err.body_text()))?;

            license_image = Some(LicenseUpload {
                file_name,
                content_type,
                bytes,
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|err| AppError::BadRequest(err.body_text()))?;
            fields.insert(name, value);
        }
    }

    let license_image = license_image
        .ok_or_else(|| AppError::BadRequest(format!("{LICENSE_IMAGE_FIELD} file is required")))?;

    let location = GeoPoint::new(
        number_field(&fields, "longitude")?,
        number_field(&fields, "latitude")?,
    )?;

    Ok(DriverSignupForm {
        name: text_field(&mut fields, "name")?,
        phone: text_field(&mut fields, "phone")?,
        password: text_field(&mut fields, "password")?,
        vehicle_number: text_field(&mut fields, "vehicleNumber")?,
        driving_license: text_field(&mut fields, "drivingLicense")?,
        location,
        license_image,
    })
}

fn text_field(fields: &mut HashMap<String, String>, key: &str) -> Result<String, AppError> {
    fields
        .remove(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{key} is required")))
}

fn number_field(fields: &HashMap<String, String>, key: &str) -> Result<f64, AppError> {
    let raw = fields
        .get(key)
        .ok_or_else(|| AppError::BadRequest(format!("{key} is required")))?;

    raw.trim()
        .parse::<f64>()
        .map_err(|_| AppError::BadRequest(format!("{key} must be a number, got {raw:?}")))
}
