use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::api::rest::hospitals::bed_count;
use crate::api::rest::upload::read_driver_signup;
use crate::auth::Role;
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::driver::{Driver, NewDriver};
use crate::models::hospital::{Hospital, NewHospital};
use crate::models::user::{NewUser, User};
use crate::state::AppState;

/// Room for the text fields of the driver signup form on top of the image itself.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn router(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/user/signup", post(signup_user))
        .route("/api/auth/user/login", post(login_user))
        .route(
            "/api/auth/driver/signup",
            post(signup_driver).layer(DefaultBodyLimit::max(
                max_upload_bytes.saturating_add(FORM_OVERHEAD_BYTES),
            )),
        )
        .route("/api/auth/driver/login", post(login_driver))
        .route("/api/auth/hospital/signup", post(signup_hospital))
        .route("/api/auth/hospital/login", post(login_hospital))
}

#[derive(Deserialize)]
pub struct UserSignupRequest {
    pub name: String,
    pub phone: String,
    pub password: String,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

#[derive(Deserialize)]
pub struct PhoneLoginRequest {
    pub phone: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalSignupRequest {
    pub name: String,
    pub registration_number: String,
    pub password: String,
    pub location: GeoPoint,
    #[serde(default)]
    pub bed_availability: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalLoginRequest {
    pub registration_number: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    pub token: String,
}

impl SessionResponse {
    fn user(user: &User, token: String) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            role: Role::User,
            phone: Some(user.phone.clone()),
            vehicle_number: None,
            registration_number: None,
            token,
        }
    }

    fn driver(driver: &Driver, token: String) -> Self {
        Self {
            id: driver.id,
            name: driver.name.clone(),
            role: Role::Driver,
            phone: Some(driver.phone.clone()),
            vehicle_number: Some(driver.vehicle_number.clone()),
            registration_number: None,
            token,
        }
    }

    fn hospital(hospital: &Hospital, token: String) -> Self {
        Self {
            id: hospital.id,
            name: hospital.name.clone(),
            role: Role::Hospital,
            phone: None,
            vehicle_number: None,
            registration_number: Some(hospital.registration_number.clone()),
            token,
        }
    }
}

fn required(key: &str, value: String) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{key} is required")));
    }
    Ok(trimmed.to_string())
}

fn invalid_credentials() -> AppError {
    AppError::BadRequest("invalid credentials".to_string())
}

async fn hash_password(state: &Arc<AppState>, password: String) -> Result<String, AppError> {
    let state = state.clone();
    tokio::task::spawn_blocking(move || state.credentials.hash_password(&password))
        .await
        .map_err(|err| AppError::Internal(format!("password hashing task failed: {err}")))?
}

async fn verify_password(
    state: &Arc<AppState>,
    password: String,
    stored: String,
) -> Result<bool, AppError> {
    let state = state.clone();
    tokio::task::spawn_blocking(move || state.credentials.verify_password(&password, &stored))
        .await
        .map_err(|err| AppError::Internal(format!("password check task failed: {err}")))
}

async fn signup_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UserSignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let Json(payload) = payload?;
    let name = required("name", payload.name)?;
    let phone = required("phone", payload.phone)?;
    if payload.password.is_empty() {
        return Err(AppError::BadRequest("password is required".to_string()));
    }

    if state.users.find_by_phone(&phone).is_some() {
        return Err(AppError::BadRequest("user already exists".to_string()));
    }

    let password_hash = hash_password(&state, payload.password).await?;
    let user = state.users.register(NewUser {
        name,
        phone,
        password_hash,
        location: payload.location,
    })?;
    let token = state.credentials.issue_token(user.id, Role::User)?;

    info!(user_id = %user.id, "user registered");
    Ok((StatusCode::CREATED, Json(SessionResponse::user(&user, token))))
}

async fn login_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PhoneLoginRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, AppError> {
    let Json(payload) = payload?;

    let user = state
        .users
        .find_by_phone(payload.phone.trim())
        .ok_or_else(invalid_credentials)?;
    if !verify_password(&state, payload.password, user.password_hash.clone()).await? {
        return Err(invalid_credentials());
    }

    let token = state.credentials.issue_token(user.id, Role::User)?;
    Ok(Json(SessionResponse::user(&user, token)))
}

async fn signup_driver(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let form = read_driver_signup(multipart?).await?;
    state.licenses.validate(&form.license_image)?;

    if state.drivers.find_by_phone(&form.phone).is_some() {
        return Err(AppError::BadRequest("driver already exists".to_string()));
    }

    let password_hash = hash_password(&state, form.password).await?;
    let license_image = state.licenses.save(&form.license_image).await?;

    let registered = state.drivers.register(NewDriver {
        name: form.name,
        phone: form.phone,
        password_hash,
        vehicle_number: form.vehicle_number,
        driving_license: form.driving_license,
        license_image: license_image.clone(),
        location: form.location,
    });
    let driver = match registered {
        Ok(driver) => driver,
        Err(err) => {
            state.licenses.remove(&license_image).await;
            return Err(err.into());
        }
    };
    let token = state.credentials.issue_token(driver.id, Role::Driver)?;

    info!(driver_id = %driver.id, "driver registered");
    Ok((StatusCode::CREATED, Json(SessionResponse::driver(&driver, token))))
}

async fn login_driver(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PhoneLoginRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, AppError> {
    let Json(payload) = payload?;

    let driver = state
        .drivers
        .find_by_phone(payload.phone.trim())
        .ok_or_else(invalid_credentials)?;
    if !verify_password(&state, payload.password, driver.password_hash.clone()).await? {
        return Err(invalid_credentials());
    }

    let token = state.credentials.issue_token(driver.id, Role::Driver)?;
    Ok(Json(SessionResponse::driver(&driver, token)))
}

async fn signup_hospital(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<HospitalSignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let Json(payload) = payload?;
    let name = required("name", payload.name)?;
    let registration_number = required("registrationNumber", payload.registration_number)?;
    if payload.password.is_empty() {
        return Err(AppError::BadRequest("password is required".to_string()));
    }
    let bed_availability = bed_count(payload.bed_availability)?;

    if state
        .hospitals
        .find_by_registration(&registration_number)
        .is_some()
    {
        return Err(AppError::BadRequest("hospital already exists".to_string()));
    }

    let password_hash = hash_password(&state, payload.password).await?;
    let hospital = state.hospitals.register(NewHospital {
        name,
        registration_number,
        password_hash,
        location: payload.location,
        bed_availability,
    })?;
    let token = state.credentials.issue_token(hospital.id, Role::Hospital)?;

    info!(hospital_id = %hospital.id, "hospital registered");
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse::hospital(&hospital, token)),
    ))
}

async fn login_hospital(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<HospitalLoginRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, AppError> {
    let Json(payload) = payload?;

    let hospital = state
        .hospitals
        .find_by_registration(payload.registration_number.trim())
        .ok_or_else(invalid_credentials)?;
    if !verify_password(&state, payload.password, hospital.password_hash.clone()).await? {
        return Err(invalid_credentials());
    }

    let token = state.credentials.issue_token(hospital.id, Role::Hospital)?;
    Ok(Json(SessionResponse::hospital(&hospital, token)))
}
