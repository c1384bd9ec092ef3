//! Radius and nearest-N queries over anything that has a position.

use std::cmp::Ordering;

use serde::Serialize;

use crate::geo::{haversine_m, GeoPoint};

pub trait Located {
    fn location(&self) -> &GeoPoint;
}

/// A query hit together with its great-circle distance from the query centre.
#[derive(Debug, Clone, Serialize)]
pub struct Ranked<T> {
    pub item: T,
    pub distance_m: f64,
}

/// Every item whose location lies within `radius_m` of `center`, nearest first.
pub fn within_radius<T, I>(items: I, center: &GeoPoint, radius_m: f64) -> Vec<Ranked<T>>
where
    T: Located,
    I: IntoIterator<Item = T>,
{
    let mut hits: Vec<Ranked<T>> = items
        .into_iter()
        .filter_map(|item| {
            let distance_m = haversine_m(center, item.location());
            (distance_m <= radius_m).then_some(Ranked { item, distance_m })
        })
        .collect();

    hits.sort_by(by_distance);
    hits
}

/// At most `limit` items within `max_distance_m` of `center`, nearest first.
pub fn nearest<T, I>(
    items: I,
    center: &GeoPoint,
    limit: usize,
    max_distance_m: f64,
) -> Vec<Ranked<T>>
where
    T: Located,
    I: IntoIterator<Item = T>,
{
    let mut hits = within_radius(items, center, max_distance_m);
    hits.truncate(limit);
    hits
}

fn by_distance<T>(a: &Ranked<T>, b: &Ranked<T>) -> Ordering {
    a.distance_m.total_cmp(&b.distance_m)
}
