use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::booking::{Booking, BookingStatus};
use crate::store::StoreError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingFilter {
    pub user_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        self.user_id.is_none_or(|id| id == booking.user_id)
            && self.driver_id.is_none_or(|id| id == booking.driver_id)
            && self.status.is_none_or(|status| status == booking.status)
    }
}

pub trait BookingStore: Send + Sync {
    fn insert(&self, booking: Booking) -> Result<(), StoreError>;

    fn get(&self, id: Uuid) -> Result<Option<Booking>, StoreError>;

    /// Matching bookings, newest first.
    fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>, StoreError>;

    /// Moves a booking to `next` if its current status allows it. The check and the
    /// write happen as one step.
    fn transition(&self, id: Uuid, next: BookingStatus) -> Result<Booking, StoreError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Default)]
pub struct MemoryBookingStore {
    bookings: DashMap<Uuid, Booking>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BookingStore for MemoryBookingStore {
    fn insert(&self, booking: Booking) -> Result<(), StoreError> {
        match self.bookings.entry(booking.id) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(booking.id)),
            Entry::Vacant(slot) => {
                slot.insert(booking);
                Ok(())
            }
        }
    }

    fn get(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        Ok(self.bookings.get(&id).map(|entry| entry.value().clone()))
    }

    fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>, StoreError> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    fn transition(&self, id: Uuid, next: BookingStatus) -> Result<Booking, StoreError> {
        let mut booking = self.bookings.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if !booking.status.can_transition_to(next) {
            return Err(StoreError::InvalidTransition {
                id,
                from: booking.status,
                to: next,
            });
        }

        booking.status = next;
        booking.updated_at = Utc::now();
        Ok(booking.clone())
    }

    fn len(&self) -> usize {
        self.bookings.len()
    }
}
