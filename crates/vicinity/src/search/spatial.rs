use tracing::debug;

use super::{RadiusQuery, Result, SearchContext};
use crate::{
    entity::{Entity, GeoPoint},
    store::SpatialStore,
};

pub const METERS_PER_KM: f64 = 1_000.0;

/// Single spatial range lookup against a [`SpatialStore`].
///
/// Ordering comes from the store's own distance computation; nothing here
/// re-sorts or re-filters.
#[derive(Debug)]
pub struct SpatialQueryExecutor<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: SpatialStore + ?Sized> SpatialQueryExecutor<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }
}

impl<S: SpatialStore + ?Sized> RadiusQuery for SpatialQueryExecutor<'_, S> {
    fn find_within_radius(
        &self,
        center: GeoPoint,
        radius_km: u32,
        ctx: &SearchContext,
    ) -> Result<Vec<Entity>> {
        ctx.check()?;
        let radius_m = f64::from(radius_km) * METERS_PER_KM;
        let entities = self.store.range_query(center, radius_m)?;
        // a store that ignored cancellation must not let the caller keep going
        ctx.check()?;
        debug!(%center, radius_km, found = entities.len(), "Range query");
        Ok(entities)
    }
}
