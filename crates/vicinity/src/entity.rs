use std::fmt;

use itertools::izip;
use polars::prelude::*;
use vicinity_data::{
    CITY_COL, ID_COL, LATITUDE_COL, LONGITUDE_COL, NAME_COL, STATE_COL, StateCode, normalize_city,
};

use crate::{error::VicinityError, store::StoreError};

/// Stable identity of an entity, used as the deduplication key when merging results.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// WGS84 point in decimal degrees.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Like [`GeoPoint::new`] but rejects non-finite or out-of-range coordinates.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, VicinityError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(VicinityError::InvalidParameter {
                name: "lat",
                reason: format!("{latitude} is not a latitude between -90 and 90"),
            });
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(VicinityError::InvalidParameter {
                name: "lon",
                reason: format!("{longitude} is not a longitude between -180 and 180"),
            });
        }
        Ok(Self::new(latitude, longitude))
    }

    /// True when either coordinate is zero, which radius search reads as "no
    /// point given" rather than a location on the equator or prime meridian.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        self.latitude == 0.0 || self.longitude == 0.0
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// A searchable, geolocated record.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub city: String,
    pub state: StateCode,
    pub location: GeoPoint,
}

impl Entity {
    /// Create `Entity` instances from a Polars `DataFrame`.
    ///
    /// The `DataFrame` is expected to contain the columns returned by
    /// `field_names()`. Row order is preserved. A null in any of them means
    /// the storage layer broke its invariants and is reported as an error.
    pub fn from_df(df: &DataFrame) -> Result<Vec<Self>, StoreError> {
        let cols = df.select(Self::field_names())?.take_columns();

        izip!(
            cols[0].u64()?,
            cols[1].str()?,
            cols[2].str()?,
            cols[3].str()?,
            cols[4].f64()?,
            cols[5].f64()?,
        )
        .enumerate()
        .map(|(row, (id, name, city, state, latitude, longitude))| -> Result<Self, StoreError> {
            let missing = |column| StoreError::MalformedRow { row, column };
            Ok(Self {
                id: EntityId(id.ok_or_else(|| missing(ID_COL))?),
                name: name.ok_or_else(|| missing(NAME_COL))?.to_string(),
                city: city.ok_or_else(|| missing(CITY_COL))?.to_string(),
                state: state.ok_or_else(|| missing(STATE_COL))?.parse()?,
                location: GeoPoint::new(
                    latitude.ok_or_else(|| missing(LATITUDE_COL))?,
                    longitude.ok_or_else(|| missing(LONGITUDE_COL))?,
                ),
            })
        })
        .collect()
    }

    /// Returns the column names expected in `DataFrames` for this entity type.
    #[must_use]
    pub fn field_names() -> Vec<&'static str> {
        vec![
            ID_COL,
            NAME_COL,
            CITY_COL,
            STATE_COL,
            LATITUDE_COL,
            LONGITUDE_COL,
        ]
    }

    /// Whether the entity lies in `state` and, when given, `city`.
    ///
    /// City names compare case-insensitively with surrounding whitespace ignored.
    #[must_use]
    pub fn matches_locality(&self, state: StateCode, city: Option<&str>) -> bool {
        self.state == state
            && city.is_none_or(|city| normalize_city(city) == normalize_city(&self.city))
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.city, self.state)
    }
}
