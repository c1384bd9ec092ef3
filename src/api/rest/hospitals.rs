use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::routing::{post, put};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::engine::search::{
    find_nearest_hospitals, HOSPITAL_MAX_DISTANCE_M, HOSPITAL_RESULT_LIMIT,
};
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::hospital::{Hospital, NearbyHospital};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/hospital/nearest", post(nearest_hospitals))
        .route("/api/hospital/bed-availability/:id", put(update_bed_availability))
}

#[derive(Deserialize)]
pub struct NearestHospitalsRequest {
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBedAvailabilityRequest {
    pub bed_availability: Option<i64>,
}

pub(crate) fn bed_count(raw: i64) -> Result<u32, AppError> {
    u32::try_from(raw).map_err(|_| {
        AppError::BadRequest(format!(
            "bedAvailability must be between 0 and {}, got {raw}",
            u32::MAX
        ))
    })
}

async fn nearest_hospitals(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NearestHospitalsRequest>, JsonRejection>,
) -> Result<Json<Vec<NearbyHospital>>, AppError> {
    let Json(payload) = payload?;

    let (Some(longitude), Some(latitude)) = (payload.longitude, payload.latitude) else {
        return Err(AppError::BadRequest(
            "longitude and latitude are required".to_string(),
        ));
    };
    let center = GeoPoint::new(longitude, latitude)?;

    Ok(Json(find_nearest_hospitals(
        &state,
        &center,
        HOSPITAL_RESULT_LIMIT,
        HOSPITAL_MAX_DISTANCE_M,
    )))
}

async fn update_bed_availability(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateBedAvailabilityRequest>, JsonRejection>,
) -> Result<Json<Hospital>, AppError> {
    let Path(id) = id?;
    let Json(payload) = payload?;

    let raw = payload
        .bed_availability
        .ok_or_else(|| AppError::BadRequest("bedAvailability is required".to_string()))?;
    let beds = bed_count(raw)?;

    let hospital = state.hospitals.update_bed_availability(id, beds)?;
    info!(hospital_id = %hospital.id, beds, "bed availability updated");

    Ok(Json(hospital))
}
