//! Vicinity - Proximity and Locality Search
//!
//! Vicinity finds geolocated entities (stores, venues, points of interest) near
//! a point, within a city/state, or both. Radius searches start small and widen
//! in fixed steps until something turns up, so sparse areas still get answers
//! while dense areas stay tight.
//!
//! # Quick Start
//!
//! ```rust
//! use vicinity::{ProximitySearcher, SearchParams, SearchRequest, data::test_data::sample_table};
//!
//! let searcher = ProximitySearcher::from_table(sample_table()?);
//!
//! // Typed request: everything near a point, plus everything in Springfield, IL
//! let request = SearchRequest::near(40.0, -73.0)
//!     .in_city("Springfield")
//!     .in_state("IL");
//! let result = searcher.search(&request)?;
//! for entity in &result.entities {
//!     println!("{entity}");
//! }
//!
//! // Raw parameters, as a transport layer would receive them
//! let params = SearchParams {
//!     lat: Some("40.0".into()),
//!     lon: Some("-73.0".into()),
//!     radius_km: Some("5".into()),
//!     ..SearchParams::default()
//! };
//! let result = searcher.search_params(&params)?;
//! assert_eq!(result.radius_used_km, 5);
//! # Ok::<(), vicinity::error::VicinityError>(())
//! ```
//!
//! # Radius expansion
//!
//! With the default steps `[1, 5, 10, 25, 50, 100]` km, a request for 1 km
//! tries 1, 5, 10, 25, 50 and 100 km. A request for `R > 1` km tries `R`, then
//! `R + 1`, `R + 5`, ... `R + 100`. The first radius with any match wins.
//!
//! # Data
//!
//! Entities live in a polars [`DataFrame`](polars::prelude::DataFrame) managed by
//! the [`data`] subcrate, loadable from JSON records or parquet. Any other
//! backend can be plugged in by implementing [`SpatialStore`].
use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod config;
mod core;
mod entity;
pub mod error;
mod request;
mod search;
pub mod store;

pub use crate::core::ProximitySearcher;

pub use config::{DEFAULT_RADIUS_ENV_VAR, STEPS_ENV_VAR, SearchConfigBuilder};
pub use entity::{Entity, EntityId, GeoPoint};
pub use request::{SearchParams, SearchRequest};
pub use search::{
    AttributeSearch, DEFAULT_RADIUS_KM, DEFAULT_RADIUS_STEPS_KM, Expansion, METERS_PER_KM,
    RadiusExpansionController, RadiusQuery, SearchConfig, SearchContext, SearchError,
    SearchResult, SpatialQueryExecutor, merge_results,
};
pub use store::{AttributeFilter, FrameStore, SpatialStore, StoreError};
pub use tokio_util::sync::CancellationToken;
pub use vicinity_data as data;
pub use vicinity_data::StateCode;

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initialize logging for the Vicinity library.
///
/// `RUST_LOG` takes precedence over `level` when set. Polars is held at
/// `warn` either way.
///
/// # Examples
///
/// ```rust
/// use tracing::Level;
/// use vicinity::init_logging;
///
/// init_logging(Level::INFO)?;
/// # Ok::<(), vicinity::error::VicinityError>(())
/// ```
pub fn init_logging(level: impl Into<LevelFilter>) -> Result<&'static (), error::VicinityError> {
    LOGGER_INIT.get_or_try_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level.into().to_string()))?
            .add_directive("polars=warn".parse()?);

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .init();
        Ok(())
    })
}
