//! Storage layer for the vicinity proximity search library.
//!
//! Entities live in a single in-memory polars [`DataFrame`](polars::prelude::DataFrame)
//! wrapped by [`EntityTable`]. The table answers the two queries the search core
//! needs: a spatial range query ordered by distance, and an exact-match
//! city/state lookup.

mod error;
pub mod record;
pub mod table;
pub mod test_data;

pub use error::{DataError, Result};
pub use record::{EntityRecord, StateCode, normalize_city, normalize_state};
pub use table::{
    CITY_COL, DISTANCE_COL, EARTH_MEAN_RADIUS_M, EntityTable, ID_COL, LATITUDE_COL, LONGITUDE_COL,
    LoadReport, NAME_COL, STATE_COL,
};
