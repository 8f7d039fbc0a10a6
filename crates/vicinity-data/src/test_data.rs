//! Deterministic fixture data for tests and demos.

use crate::{
    error::Result,
    record::EntityRecord,
    table::{EARTH_MEAN_RADIUS_M, EntityTable},
};

/// Point `km` kilometers due north of `(latitude, longitude)`.
///
/// Along a meridian the haversine distance is exactly the arc length, so
/// fixtures built with this sit at precisely known distances from the origin.
#[must_use]
pub fn offset_north((latitude, longitude): (f64, f64), km: f64) -> (f64, f64) {
    let delta_deg = (km * 1_000.0 / EARTH_MEAN_RADIUS_M).to_degrees();
    (latitude + delta_deg, longitude)
}

/// A small mixed dataset.
///
/// - id 1 `Harbor Diner` sits exactly on (40.0, -73.0)
/// - id 2 `Ridge Bakery` at (40.5, -73.0), roughly 55.6 km north of it
/// - id 3 `Lincoln Books` in Springfield, IL, far from both
/// - a handful of other New York, Illinois and California entities
#[must_use]
pub fn sample_records() -> Vec<EntityRecord> {
    vec![
        EntityRecord::new("Harbor Diner", "Seaside", "NY", 40.0, -73.0).with_id(1),
        EntityRecord::new("Ridge Bakery", "Northport", "NY", 40.5, -73.0).with_id(2),
        EntityRecord::new("Lincoln Books", "Springfield", "IL", 39.7817, -89.6501).with_id(3),
        EntityRecord::new("Capitol Coffee", "Springfield", "IL", 39.7990, -89.6440).with_id(4),
        EntityRecord::new("Prairie Hardware", "Peoria", "IL", 40.6936, -89.5890).with_id(5),
        EntityRecord::new("Joe's Pizza", "New York", "NY", 40.7306, -73.9866).with_id(6),
        EntityRecord::new("Blue Bottle", "Oakland", "CA", 37.8044, -122.2712).with_id(7),
        EntityRecord::new("Ozark Outfitters", "Springfield", "MO", 37.2090, -93.2923).with_id(8),
    ]
}

pub fn sample_table() -> Result<EntityTable> {
    EntityTable::from_records(sample_records()).map(|(table, _)| table)
}

/// Entities due north of `origin` at each of the given distances, ids from 1.
#[must_use]
pub fn ring_records(origin: (f64, f64), distances_km: &[f64]) -> Vec<EntityRecord> {
    distances_km
        .iter()
        .enumerate()
        .map(|(i, &km)| {
            let (latitude, longitude) = offset_north(origin, km);
            EntityRecord::new(format!("Ring {km} km"), "Ringtown", "NY", latitude, longitude)
                .with_id(i as u64 + 1)
        })
        .collect()
}
