//! The storage seam between the search core and wherever entities live.
//!
//! [`SpatialStore`] is the contract the core relies on; [`FrameStore`] is the
//! bundled implementation over an in-memory [`EntityTable`].

use std::{path::Path, sync::Arc};

use thiserror::Error;
use tracing::{info, instrument};
use vicinity_data::{DataError, EntityRecord, EntityTable, LoadReport, StateCode};

use crate::entity::{Entity, GeoPoint};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("DataFrame error: {0}")]
    DataFrame(#[from] polars::prelude::PolarsError),
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    #[error("Malformed row {row}: column '{column}' is null")]
    MalformedRow { row: usize, column: &'static str },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Exact-match locality filter. `state` is required, `city` narrows further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeFilter<'a> {
    pub state: StateCode,
    pub city: Option<&'a str>,
}

/// Read access to a set of entities.
///
/// Implementations must be safe for concurrent reads; the core never mutates
/// through this trait.
pub trait SpatialStore: Send + Sync {
    /// Every entity within `radius_m` meters of `center`, nearest first.
    ///
    /// The same distance computation must drive both the filter and the
    /// ordering, so the core never re-sorts what comes back.
    fn range_query(&self, center: GeoPoint, radius_m: f64) -> StoreResult<Vec<Entity>>;

    /// Every entity matching the locality filter.
    fn attribute_query(&self, filter: &AttributeFilter<'_>) -> StoreResult<Vec<Entity>>;
}

impl<S: SpatialStore + ?Sized> SpatialStore for Arc<S> {
    fn range_query(&self, center: GeoPoint, radius_m: f64) -> StoreResult<Vec<Entity>> {
        (**self).range_query(center, radius_m)
    }

    fn attribute_query(&self, filter: &AttributeFilter<'_>) -> StoreResult<Vec<Entity>> {
        (**self).attribute_query(filter)
    }
}

/// [`SpatialStore`] over an in-memory polars-backed [`EntityTable`].
#[derive(Debug, Clone)]
pub struct FrameStore {
    table: EntityTable,
}

impl FrameStore {
    #[must_use]
    pub fn new(table: EntityTable) -> Self {
        Self { table }
    }

    pub fn from_records<I>(records: I) -> StoreResult<(Self, LoadReport)>
    where
        I: IntoIterator<Item = EntityRecord>,
    {
        let (table, report) = EntityTable::from_records(records)?;
        Ok((Self::new(table), report))
    }

    #[instrument(name = "Load FrameStore from JSON", level = "info", skip_all)]
    pub fn from_json_file(path: impl AsRef<Path>) -> StoreResult<(Self, LoadReport)> {
        let (table, report) = EntityTable::from_json_file(path)?;
        info!(
            created = report.created,
            skipped = report.skipped,
            "Loaded entities"
        );
        Ok((Self::new(table), report))
    }

    pub fn read_parquet(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::new(EntityTable::read_parquet(path)?))
    }

    #[must_use]
    pub fn table(&self) -> &EntityTable {
        &self.table
    }
}

impl SpatialStore for FrameStore {
    fn range_query(&self, center: GeoPoint, radius_m: f64) -> StoreResult<Vec<Entity>> {
        let df = self
            .table
            .range_query(center.latitude, center.longitude, radius_m)?;
        Entity::from_df(&df)
    }

    fn attribute_query(&self, filter: &AttributeFilter<'_>) -> StoreResult<Vec<Entity>> {
        let df = self.table.attribute_query(filter.state, filter.city)?;
        Entity::from_df(&df)
    }
}
