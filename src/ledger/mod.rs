//! Availability ledger: the owner of every driver record.
//!
//! `available` is only ever written through this type. The booking path uses
//! [`AvailabilityLedger::try_set_unavailable`], which compares and flips the flag while
//! holding the write guard of the driver's shard, so no two callers can both observe
//! `available == true` for the same driver.

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::driver::{Driver, NewDriver};

#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("driver {0} not found")]
    NotFound(Uuid),

    #[error("driver {0} is already booked")]
    AlreadyBooked(Uuid),

    #[error("driver with phone {0} already exists")]
    DuplicatePhone(String),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(_) => AppError::NotFound("ambulance not found".to_string()),
            LedgerError::AlreadyBooked(_) => AppError::AlreadyBooked,
            LedgerError::DuplicatePhone(_) => {
                AppError::BadRequest("driver already exists".to_string())
            }
        }
    }
}

#[derive(Default)]
pub struct AvailabilityLedger {
    drivers: DashMap<Uuid, Driver>,
    phones: DashMap<String, Uuid>,
}

impl AvailabilityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an off-duty driver. Phone numbers are unique across drivers.
    pub fn register(&self, new_driver: NewDriver) -> Result<Driver, LedgerError> {
        match self.phones.entry(new_driver.phone.clone()) {
            Entry::Occupied(_) => Err(LedgerError::DuplicatePhone(new_driver.phone)),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let driver = Driver {
                    id: Uuid::new_v4(),
                    name: new_driver.name,
                    phone: new_driver.phone,
                    password_hash: new_driver.password_hash,
                    vehicle_number: new_driver.vehicle_number,
                    driving_license: new_driver.driving_license,
                    license_image: new_driver.license_image,
                    location: new_driver.location,
                    available: false,
                    availability_revision: 0,
                    created_at: now,
                    updated_at: now,
                };
                self.drivers.insert(driver.id, driver.clone());
                slot.insert(driver.id);
                Ok(driver)
            }
        }
    }

    pub fn get(&self, id: Uuid) -> Option<Driver> {
        self.drivers.get(&id).map(|entry| entry.value().clone())
    }

    pub fn find_by_phone(&self, phone: &str) -> Option<Driver> {
        let id = *self.phones.get(phone)?;
        self.get(id)
    }

    /// Atomically flips `available` from `true` to `false`.
    pub fn try_set_unavailable(&self, id: Uuid) -> Result<Driver, LedgerError> {
        let mut driver = self.drivers.get_mut(&id).ok_or(LedgerError::NotFound(id))?;

        if !driver.available {
            return Err(LedgerError::AlreadyBooked(id));
        }

        driver.available = false;
        driver.availability_revision += 1;
        driver.updated_at = Utc::now();
        Ok(driver.clone())
    }

    /// Undoes a [`try_set_unavailable`](Self::try_set_unavailable) whose booking was never
    /// recorded. Returns `false`, leaving the driver untouched, when any availability write
    /// happened after `reserved_revision`.
    pub fn release_reservation(
        &self,
        id: Uuid,
        reserved_revision: u64,
    ) -> Result<bool, LedgerError> {
        let mut driver = self.drivers.get_mut(&id).ok_or(LedgerError::NotFound(id))?;

        if driver.available || driver.availability_revision != reserved_revision {
            return Ok(false);
        }

        driver.available = true;
        driver.availability_revision += 1;
        driver.updated_at = Utc::now();
        Ok(true)
    }

    /// Unconditional override used by duty toggling and by booking close.
    pub fn set_availability(&self, id: Uuid, available: bool) -> Result<Driver, LedgerError> {
        let mut driver = self.drivers.get_mut(&id).ok_or(LedgerError::NotFound(id))?;

        driver.availability_revision += 1;
        if driver.available != available {
            driver.available = available;
            driver.updated_at = Utc::now();
        }
        Ok(driver.clone())
    }

    pub fn update_location(&self, id: Uuid, location: GeoPoint) -> Result<Driver, LedgerError> {
        let mut driver = self.drivers.get_mut(&id).ok_or(LedgerError::NotFound(id))?;

        driver.location = location;
        driver.updated_at = Utc::now();
        Ok(driver.clone())
    }

    pub fn available_drivers(&self) -> Vec<Driver> {
        self.drivers
            .iter()
            .filter(|entry| entry.value().available)
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn available_count(&self) -> usize {
        self.drivers
            .iter()
            .filter(|entry| entry.value().available)
            .count()
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}
