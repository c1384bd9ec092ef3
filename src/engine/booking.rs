//! Booking manager: reserve a driver, record the booking, close it later.
//!
//! The only availability check on the booking path is the ledger's compare-and-set. A
//! booking is written after the flip succeeds; if that write fails the driver is released
//! again before the error is returned.

use std::time::Instant;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::ledger::LedgerError;
use crate::models::booking::{Booking, BookingEvent, BookingStatus};
use crate::models::driver::Driver;
use crate::state::AppState;
use crate::store::{BookingFilter, StoreError};

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub user_id: Uuid,
    pub driver_id: Uuid,
    /// Overrides the user's last known location for the snapshot.
    pub location: Option<GeoPoint>,
}

pub fn create_booking(state: &AppState, request: BookingRequest) -> Result<Booking, AppError> {
    let start = Instant::now();
    let result = reserve_and_record(state, &request);

    let outcome = match &result {
        Ok(_) => "success",
        Err(AppError::AlreadyBooked) => "already_booked",
        Err(AppError::NotFound(_)) => "not_found",
        Err(AppError::BadRequest(_)) => "invalid",
        Err(_) => "error",
    };
    state
        .metrics
        .record_booking(outcome, start.elapsed().as_secs_f64());

    result
}

fn reserve_and_record(state: &AppState, request: &BookingRequest) -> Result<Booking, AppError> {
    if state.drivers.get(request.driver_id).is_none() {
        return Err(AppError::NotFound("ambulance not found".to_string()));
    }

    let user = state
        .users
        .get(request.user_id)
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

    let location = request.location.or(user.location).ok_or_else(|| {
        AppError::BadRequest("user location is unknown, include location in the request".to_string())
    })?;

    let reserved = match state.drivers.try_set_unavailable(request.driver_id) {
        Ok(driver) => driver,
        Err(LedgerError::AlreadyBooked(driver_id)) => {
            info!(driver_id = %driver_id, user_id = %user.id, "booking lost availability race");
            return Err(AppError::AlreadyBooked);
        }
        Err(err) => return Err(err.into()),
    };

    let booking = Booking::new(user.id, request.driver_id, location);
    if let Err(err) = state.bookings.insert(booking.clone()) {
        release_unrecorded_driver(state, &reserved, &err);
        return Err(AppError::Internal(format!("failed to persist booking: {err}")));
    }

    if request.location.is_some() {
        if let Err(err) = state.users.update_location(user.id, location) {
            warn!(user_id = %user.id, error = %err, "failed to store user location");
        }
    }

    state.sync_availability_gauge();
    let _ = state.booking_events_tx.send(BookingEvent::from(&booking));

    info!(
        booking_id = %booking.id,
        driver_id = %booking.driver_id,
        user_id = %booking.user_id,
        "ambulance booked"
    );

    Ok(booking)
}

fn release_unrecorded_driver(state: &AppState, reserved: &Driver, cause: &StoreError) {
    state.metrics.booking_compensations_total.inc();

    match state
        .drivers
        .release_reservation(reserved.id, reserved.availability_revision)
    {
        Ok(true) => warn!(
            driver_id = %reserved.id,
            error = %cause,
            "booking not persisted; driver released"
        ),
        Ok(false) => warn!(
            driver_id = %reserved.id,
            error = %cause,
            "booking not persisted; availability changed since reservation, left as is"
        ),
        Err(release_err) => error!(
            driver_id = %reserved.id,
            error = %cause,
            release_error = %release_err,
            "booking not persisted and driver could not be released"
        ),
    }
}

/// The booking currently holding `driver_id`, if any.
pub fn open_booking(state: &AppState, driver_id: Uuid) -> Result<Option<Booking>, AppError> {
    let filter = BookingFilter {
        driver_id: Some(driver_id),
        status: Some(BookingStatus::Booked),
        ..BookingFilter::default()
    };
    Ok(state.bookings.list(&filter)?.into_iter().next())
}

/// Duty toggle. Always applied; switching on a driver who still has an open booking is
/// logged because the next booking will overlap the current ride.
pub fn set_driver_availability(
    state: &AppState,
    driver_id: Uuid,
    available: bool,
) -> Result<Driver, AppError> {
    if available {
        if let Some(booking) = open_booking(state, driver_id)? {
            warn!(
                driver_id = %driver_id,
                booking_id = %booking.id,
                "driver set available while a booking is still open"
            );
        }
    }

    let driver = state.drivers.set_availability(driver_id, available)?;
    state.sync_availability_gauge();

    info!(driver_id = %driver.id, available = driver.available, "driver availability set");
    Ok(driver)
}

/// Ride finished. The driver becomes available again.
pub fn complete_booking(state: &AppState, booking_id: Uuid) -> Result<Booking, AppError> {
    close_booking(state, booking_id, BookingStatus::Completed)
}

/// Ride called off. The driver becomes available again.
pub fn cancel_booking(state: &AppState, booking_id: Uuid) -> Result<Booking, AppError> {
    close_booking(state, booking_id, BookingStatus::Cancelled)
}

fn close_booking(
    state: &AppState,
    booking_id: Uuid,
    next: BookingStatus,
) -> Result<Booking, AppError> {
    let booking = state.bookings.transition(booking_id, next)?;

    state.drivers.set_availability(booking.driver_id, true)?;
    state.sync_availability_gauge();
    let _ = state.booking_events_tx.send(BookingEvent::from(&booking));

    info!(
        booking_id = %booking.id,
        driver_id = %booking.driver_id,
        status = booking.status.as_str(),
        "booking closed"
    );

    Ok(booking)
}
