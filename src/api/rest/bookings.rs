use std::sync::Arc;

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use uuid::Uuid;

use crate::engine::booking::{cancel_booking, complete_booking};
use crate::error::AppError;
use crate::models::booking::Booking;
use crate::state::AppState;
use crate::store::BookingFilter;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/bookings", get(list_bookings))
        .route("/api/bookings/:id", get(get_booking))
        .route("/api/bookings/:id/complete", post(complete))
        .route("/api/bookings/:id/cancel", post(cancel))
}

async fn list_bookings(
    State(state): State<Arc<AppState>>,
    filter: Result<Query<BookingFilter>, QueryRejection>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let Query(filter) = filter?;
    Ok(Json(state.bookings.list(&filter)?))
}

async fn get_booking(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Booking>, AppError> {
    let Path(id) = id?;

    let booking = state
        .bookings
        .get(id)?
        .ok_or_else(|| AppError::NotFound("booking not found".to_string()))?;

    Ok(Json(booking))
}

async fn complete(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Booking>, AppError> {
    let Path(id) = id?;
    Ok(Json(complete_booking(&state, id)?))
}

async fn cancel(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Booking>, AppError> {
    let Path(id) = id?;
    Ok(Json(cancel_booking(&state, id)?))
}
