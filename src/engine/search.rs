use crate::geo::index::{nearest, within_radius};
use crate::geo::GeoPoint;
use crate::models::driver::NearbyDriver;
use crate::models::hospital::NearbyHospital;
use crate::state::AppState;

pub const DEFAULT_RADIUS_KM: f64 = 2.0;
pub const HOSPITAL_RESULT_LIMIT: usize = 5;
pub const HOSPITAL_MAX_DISTANCE_M: f64 = 10_000.0;

/// Available drivers within `radius_m` of `center`, nearest first.
pub fn find_nearby_ambulances(
    state: &AppState,
    center: &GeoPoint,
    radius_m: f64,
) -> Vec<NearbyDriver> {
    let hits = within_radius(state.drivers.available_drivers(), center, radius_m);
    state.metrics.record_search("ambulance", hits.len());

    hits.into_iter()
        .map(|hit| NearbyDriver {
            id: hit.item.id,
            name: hit.item.name,
            phone: hit.item.phone,
            vehicle_number: hit.item.vehicle_number,
            distance_meters: hit.distance_m,
        })
        .collect()
}

pub fn find_nearest_hospitals(
    state: &AppState,
    center: &GeoPoint,
    limit: usize,
    max_distance_m: f64,
) -> Vec<NearbyHospital> {
    let hits = nearest(state.hospitals.snapshot(), center, limit, max_distance_m);
    state.metrics.record_search("hospital", hits.len());

    hits.into_iter()
        .map(|hit| NearbyHospital {
            id: hit.item.id,
            name: hit.item.name,
            location: hit.item.location,
            bed_availability: hit.item.bed_availability,
            distance_meters: hit.distance_m,
        })
        .collect()
}
