use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::booking::{create_booking, set_driver_availability, BookingRequest};
use crate::engine::search::{find_nearby_ambulances, DEFAULT_RADIUS_KM};
use crate::error::AppError;
use crate::geo::{km_to_meters, GeoPoint};
use crate::models::booking::Booking;
use crate::models::driver::{DriverSummary, NearbyDriver};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/ambulance/find", get(find_ambulances))
        .route("/api/ambulance/book", post(book_ambulance))
        .route("/api/ambulance/drivers/:id", get(get_driver))
        .route(
            "/api/ambulance/drivers/:id/availability",
            patch(update_availability),
        )
        .route("/api/ambulance/drivers/:id/location", patch(update_location))
}

/// `radius` is in kilometres; it is converted to meters before the search.
#[derive(Deserialize)]
pub struct FindAmbulancesQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAmbulanceRequest {
    pub user_id: Uuid,
    pub driver_id: Uuid,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

#[derive(Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub available: bool,
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub location: GeoPoint,
}

async fn find_ambulances(
    State(state): State<Arc<AppState>>,
    query: Result<Query<FindAmbulancesQuery>, QueryRejection>,
) -> Result<Json<Vec<NearbyDriver>>, AppError> {
    let Query(query) = query?;

    let (Some(lat), Some(lng)) = (query.lat, query.lng) else {
        return Err(AppError::BadRequest("lat and lng are required".to_string()));
    };
    let center = GeoPoint::new(lng, lat)?;

    let radius_km = query.radius.unwrap_or(DEFAULT_RADIUS_KM);
    if !radius_km.is_finite() || radius_km < 0.0 {
        return Err(AppError::BadRequest(
            "radius must be a non-negative number of kilometres".to_string(),
        ));
    }

    let drivers = find_nearby_ambulances(&state, &center, km_to_meters(radius_km));
    if drivers.is_empty() {
        return Err(AppError::NotFound("no ambulances found nearby".to_string()));
    }

    Ok(Json(drivers))
}

async fn book_ambulance(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BookAmbulanceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let Json(payload) = payload?;

    let booking = create_booking(
        &state,
        BookingRequest {
            user_id: payload.user_id,
            driver_id: payload.driver_id,
            location: payload.location,
        },
    )?;

    Ok((StatusCode::CREATED, Json(booking)))
}

async fn get_driver(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<DriverSummary>, AppError> {
    let Path(id) = id?;

    let driver = state
        .drivers
        .get(id)
        .ok_or_else(|| AppError::NotFound("ambulance not found".to_string()))?;

    Ok(Json(DriverSummary::from(&driver)))
}

async fn update_availability(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateAvailabilityRequest>, JsonRejection>,
) -> Result<Json<DriverSummary>, AppError> {
    let Path(id) = id?;
    let Json(payload) = payload?;

    let driver = set_driver_availability(&state, id, payload.available)?;
    Ok(Json(DriverSummary::from(&driver)))
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateLocationRequest>, JsonRejection>,
) -> Result<Json<DriverSummary>, AppError> {
    let Path(id) = id?;
    let Json(payload) = payload?;

    let driver = state.drivers.update_location(id, payload.location)?;
    Ok(Json(DriverSummary::from(&driver)))
}
