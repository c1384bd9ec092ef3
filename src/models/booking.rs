use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Booked,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// `booked` may move to either terminal state; terminal states never move.
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        self == BookingStatus::Booked && next.is_terminal()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Booked => "booked",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub driver_id: Uuid,
    /// Where the user was when the booking was made. Not updated afterwards.
    pub location: GeoPoint,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(user_id: Uuid, driver_id: Uuid, location: GeoPoint) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            driver_id,
            location,
            status: BookingStatus::Booked,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Published on the booking event feed whenever a booking is created or closed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingEvent {
    pub booking_id: Uuid,
    pub user_id: Uuid,
    pub driver_id: Uuid,
    pub status: BookingStatus,
    pub at: DateTime<Utc>,
}

impl From<&Booking> for BookingEvent {
    fn from(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id,
            user_id: booking.user_id,
            driver_id: booking.driver_id,
            status: booking.status,
            at: booking.updated_at,
        }
    }
}
