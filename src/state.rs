use std::sync::Arc;

use chrono::Duration;
use tokio::sync::broadcast;

use crate::auth::Credentials;
use crate::config::Config;
use crate::directory::{HospitalDirectory, UserDirectory};
use crate::ledger::AvailabilityLedger;
use crate::models::booking::BookingEvent;
use crate::observability::metrics::Metrics;
use crate::store::{BookingStore, LicenseStore, MemoryBookingStore};

pub struct AppState {
    pub users: UserDirectory,
    pub drivers: AvailabilityLedger,
    pub hospitals: HospitalDirectory,
    pub bookings: Arc<dyn BookingStore>,
    pub licenses: LicenseStore,
    pub credentials: Credentials,
    pub booking_events_tx: broadcast::Sender<BookingEvent>,
    pub request_timeout: std::time::Duration,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self::with_booking_store(config, Arc::new(MemoryBookingStore::new()))
    }

    pub fn with_booking_store(config: &Config, bookings: Arc<dyn BookingStore>) -> Self {
        let (booking_events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);

        Self {
            users: UserDirectory::new(),
            drivers: AvailabilityLedger::new(),
            hospitals: HospitalDirectory::new(),
            bookings,
            licenses: LicenseStore::new(config.upload_dir.clone(), config.max_upload_bytes),
            credentials: Credentials::new(
                config.jwt_secret.clone(),
                Duration::days(config.token_ttl_days),
                config.bcrypt_cost,
            ),
            booking_events_tx,
            request_timeout: std::time::Duration::from_millis(config.request_timeout_ms),
            metrics: Metrics::new(),
        }
    }

    /// Refreshes the `available_drivers` gauge after a ledger write.
    pub fn sync_availability_gauge(&self) {
        let available = i64::try_from(self.drivers.available_count()).unwrap_or(i64::MAX);
        self.metrics.available_drivers.set(available);
    }
}
