//! Search functionality for proximity and locality matching.
//!
//! This module holds the radius-expansion controller, the single-radius spatial
//! executor, the city/state attribute search and the merger that combines
//! their results.

pub use error::SearchError;
mod attribute;
mod context;
mod expansion;
mod merge;
mod spatial;

pub use attribute::AttributeSearch;
pub use context::SearchContext;
use error::Result;
pub use expansion::{Expansion, RadiusExpansionController, RadiusQuery};
pub use merge::merge_results;
pub use spatial::{METERS_PER_KM, SpatialQueryExecutor};

use crate::{SearchConfigBuilder, entity::Entity};

/// Radius increments tried, in order, when no larger radius is requested.
pub const DEFAULT_RADIUS_STEPS_KM: [u32; 6] = [1, 5, 10, 25, 50, 100];
/// Radius used when a request gives none, or gives one that cannot be read.
pub const DEFAULT_RADIUS_KM: u32 = 1;

/// Configuration for proximity search operations.
///
/// Use [`SearchConfigBuilder`] for validated construction.
///
/// # Examples
///
/// ```rust
/// use vicinity::SearchConfig;
///
/// let config = SearchConfig::builder()
///     .steps_km([2, 10, 50])
///     .build()?;
/// assert_eq!(config.steps_km, vec![2, 10, 50]);
/// # Ok::<(), vicinity::error::VicinityError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Positive radius increments in kilometers, tried in order
    pub steps_km: Vec<u32>,
    /// Radius substituted when a request's radius is missing or unreadable
    pub default_radius_km: u32,
    /// Re-check attribute results against the requested city/state
    pub post_filter_attributes: bool,
}

impl SearchConfig {
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            steps_km: DEFAULT_RADIUS_STEPS_KM.to_vec(),
            default_radius_km: DEFAULT_RADIUS_KM,
            post_filter_attributes: true,
        }
    }
}

/// Combined outcome of a search.
///
/// `entities` holds each entity at most once. The radius-derived entities come
/// first, nearest first; locality matches not already present follow.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    pub entities: Vec<Entity>,
    /// Radius at which the radius search found something, 0 if it found nothing
    /// or was not requested
    pub radius_used_km: u32,
}

impl SearchResult {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = crate::EntityId> + '_ {
        self.entities.iter().map(|e| e.id)
    }
}

mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum SearchError {
        #[error("Storage query failed: {0}")]
        Execution(#[from] crate::store::StoreError),
        #[error("Search cancelled")]
        Cancelled,
        #[error("Search deadline exceeded")]
        DeadlineExceeded,
    }
    pub type Result<T> = std::result::Result<T, SearchError>;
}
