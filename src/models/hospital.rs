use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::geo::index::Located;
use crate::geo::GeoPoint;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    pub id: Uuid,
    pub name: String,
    pub registration_number: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub location: GeoPoint,
    pub bed_availability: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Located for Hospital {
    fn location(&self) -> &GeoPoint {
        &self.location
    }
}

pub struct NewHospital {
    pub name: String,
    pub registration_number: String,
    pub password_hash: String,
    pub location: GeoPoint,
    pub bed_availability: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyHospital {
    pub id: Uuid,
    pub name: String,
    pub location: GeoPoint,
    pub bed_availability: u32,
    pub distance_meters: f64,
}
