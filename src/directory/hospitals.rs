use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::directory::DirectoryError;
use crate::models::hospital::{Hospital, NewHospital};

#[derive(Default)]
pub struct HospitalDirectory {
    hospitals: DashMap<Uuid, Hospital>,
    registrations: DashMap<String, Uuid>,
}

impl HospitalDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, new_hospital: NewHospital) -> Result<Hospital, DirectoryError> {
        match self
            .registrations
            .entry(new_hospital.registration_number.clone())
        {
            Entry::Occupied(_) => Err(DirectoryError::AlreadyExists("hospital")),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let hospital = Hospital {
                    id: Uuid::new_v4(),
                    name: new_hospital.name,
                    registration_number: new_hospital.registration_number,
                    password_hash: new_hospital.password_hash,
                    location: new_hospital.location,
                    bed_availability: new_hospital.bed_availability,
                    created_at: now,
                    updated_at: now,
                };
                self.hospitals.insert(hospital.id, hospital.clone());
                slot.insert(hospital.id);
                Ok(hospital)
            }
        }
    }

    pub fn get(&self, id: Uuid) -> Option<Hospital> {
        self.hospitals.get(&id).map(|entry| entry.value().clone())
    }

    pub fn find_by_registration(&self, registration_number: &str) -> Option<Hospital> {
        let id = *self.registrations.get(registration_number)?;
        self.get(id)
    }

    pub fn update_bed_availability(
        &self,
        id: Uuid,
        bed_availability: u32,
    ) -> Result<Hospital, DirectoryError> {
        let mut hospital = self
            .hospitals
            .get_mut(&id)
            .ok_or(DirectoryError::NotFound("hospital"))?;

        hospital.bed_availability = bed_availability;
        hospital.updated_at = Utc::now();
        Ok(hospital.clone())
    }

    pub fn snapshot(&self) -> Vec<Hospital> {
        self.hospitals
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.hospitals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hospitals.is_empty()
    }
}
