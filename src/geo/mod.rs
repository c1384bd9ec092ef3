pub mod index;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AppError;

/// Mean equatorial radius used for every great-circle computation.
///
/// A radius in meters maps to the angular radius of a centre-sphere query as
/// `radius_m / EARTH_RADIUS_M`.
pub const EARTH_RADIUS_KM: f64 = 6_378.1;
pub const EARTH_RADIUS_M: f64 = EARTH_RADIUS_KM * 1_000.0;

#[derive(Debug, Error, PartialEq)]
pub enum GeoError {
    #[error("longitude must be a finite number in [-180, 180], got {0}")]
    Longitude(f64),

    #[error("latitude must be a finite number in [-90, 90], got {0}")]
    Latitude(f64),
}

impl From<GeoError> for AppError {
    fn from(err: GeoError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// A WGS84-style position. On the wire it is a GeoJSON point,
/// `{"type": "Point", "coordinates": [lng, lat]}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "GeoJsonPoint", try_from = "GeoJsonPoint")]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lng: f64, lat: f64) -> Result<Self, GeoError> {
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(GeoError::Longitude(lng));
        }
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(GeoError::Latitude(lat));
        }
        Ok(Self { lat, lng })
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
enum PointKind {
    #[default]
    Point,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeoJsonPoint {
    #[serde(rename = "type", default)]
    kind: PointKind,
    coordinates: [f64; 2],
}

impl From<GeoPoint> for GeoJsonPoint {
    fn from(point: GeoPoint) -> Self {
        Self {
            kind: PointKind::Point,
            coordinates: [point.lng, point.lat],
        }
    }
}

impl TryFrom<GeoJsonPoint> for GeoPoint {
    type Error = GeoError;

    fn try_from(raw: GeoJsonPoint) -> Result<Self, Self::Error> {
        let [lng, lat] = raw.coordinates;
        GeoPoint::new(lng, lat)
    }
}

pub fn km_to_meters(km: f64) -> f64 {
    km * 1_000.0
}

pub fn haversine_m(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * central_angle
}
