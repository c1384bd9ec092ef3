use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::geo::GeoPoint;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Last position reported by the user's app; snapshotted into each booking.
    pub location: Option<GeoPoint>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewUser {
    pub name: String,
    pub phone: String,
    pub password_hash: String,
    pub location: Option<GeoPoint>,
}
