use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::geo::index::Located;
use crate::geo::GeoPoint;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub vehicle_number: String,
    pub driving_license: String,
    /// Reference returned by the license store, not the image itself.
    pub license_image: String,
    pub location: GeoPoint,
    pub available: bool,
    /// Bumped on every availability write, including no-op overrides.
    #[serde(skip_serializing)]
    pub availability_revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Located for Driver {
    fn location(&self) -> &GeoPoint {
        &self.location
    }
}

pub struct NewDriver {
    pub name: String,
    pub phone: String,
    pub password_hash: String,
    pub vehicle_number: String,
    pub driving_license: String,
    pub license_image: String,
    pub location: GeoPoint,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverSummary {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub vehicle_number: String,
    pub location: GeoPoint,
    pub available: bool,
}

impl From<&Driver> for DriverSummary {
    fn from(driver: &Driver) -> Self {
        Self {
            id: driver.id,
            name: driver.name.clone(),
            phone: driver.phone.clone(),
            vehicle_number: driver.vehicle_number.clone(),
            location: driver.location,
            available: driver.available,
        }
    }
}

/// One row of an ambulance search.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyDriver {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub vehicle_number: String,
    pub distance_meters: f64,
}
