//! Persistence seams. Bookings go through [`BookingStore`] so the booking manager can be
//! exercised against a store that fails; license images go through [`files::LicenseStore`].

pub mod bookings;
pub mod files;

use thiserror::Error;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::booking::BookingStatus;

pub use bookings::{BookingFilter, BookingStore, MemoryBookingStore};
pub use files::{LicenseStore, LicenseUpload};

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("booking {0} not found")]
    NotFound(Uuid),

    #[error("booking {0} already exists")]
    Duplicate(Uuid),

    #[error("booking {id} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => AppError::NotFound("booking not found".to_string()),
            StoreError::InvalidTransition { from, .. } => {
                AppError::Conflict(format!("booking is already {}", from.as_str()))
            }
            StoreError::Duplicate(_) | StoreError::Unavailable(_) => {
                AppError::Internal(err.to_string())
            }
        }
    }
}
