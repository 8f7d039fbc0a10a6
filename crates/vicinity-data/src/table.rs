use std::{
    f64::consts::PI,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use ahash::AHashSet as HashSet;
use polars::prelude::*;
use tracing::{debug, info, instrument};

use crate::{
    error::{DataError, Result},
    record::{EntityRecord, StateCode, normalize_city},
};

pub const ID_COL: &str = "id";
pub const NAME_COL: &str = "name";
pub const CITY_COL: &str = "city";
pub const STATE_COL: &str = "state";
pub const LATITUDE_COL: &str = "latitude";
pub const LONGITUDE_COL: &str = "longitude";
/// Added by [`EntityTable::range_query`]: great-circle distance from the query point in meters.
pub const DISTANCE_COL: &str = "distance_m";
const CITY_KEY_COL: &str = "city_key";

/// Mean Earth radius (IUGG) in meters.
pub const EARTH_MEAN_RADIUS_M: f64 = 6_371_008.8;
const DEG_TO_RAD: f64 = PI / 180.0;

/// Outcome of loading records into an [`EntityTable`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub created: usize,
    /// Records dropped because an earlier record had the same name, city and state.
    pub skipped: usize,
}

/// Read-only table of entities backed by a polars [`DataFrame`].
///
/// Every row has a unique id, a non-empty name, a state from [`StateCode`] and
/// finite WGS84 coordinates. States are stored as canonical codes and a derived
/// key column holds the normalised city, so attribute lookups compare
/// case-insensitively.
#[derive(Debug, Clone)]
pub struct EntityTable {
    df: DataFrame,
}

impl EntityTable {
    /// Build a table from import records.
    ///
    /// Invalid records abort the load. Records repeating the (name, city, state)
    /// of an earlier record are skipped, and records without an id are numbered
    /// after the largest explicit id.
    #[instrument(name = "Build EntityTable", level = "info", skip_all)]
    pub fn from_records<I>(records: I) -> Result<(Self, LoadReport)>
    where
        I: IntoIterator<Item = EntityRecord>,
    {
        let t_build = std::time::Instant::now();
        let mut seen: HashSet<(String, String, StateCode)> = HashSet::new();
        let mut explicit_ids: HashSet<u64> = HashSet::new();
        let mut kept = Vec::new();
        let mut report = LoadReport::default();

        for (index, record) in records.into_iter().enumerate() {
            let state = record
                .validate()
                .map_err(|reason| DataError::InvalidRecord { index, reason })?;
            let key = (record.name.trim().to_string(), normalize_city(&record.city), state);
            if !seen.insert(key) {
                debug!(index, name = %record.name, "Skipping duplicate record");
                report.skipped += 1;
                continue;
            }
            if let Some(id) = record.id
                && !explicit_ids.insert(id)
            {
                return Err(DataError::DuplicateId(id));
            }
            kept.push((record, state));
        }

        // computed only when some record lacks an id
        let first_fresh_id = if kept.iter().any(|(record, _)| record.id.is_none()) {
            match explicit_ids.iter().max() {
                Some(max) => max.checked_add(1).ok_or(DataError::IdSpaceExhausted)?,
                None => 1,
            }
        } else {
            1
        };
        let mut fresh_ids = first_fresh_id..=u64::MAX;
        let len = kept.len();
        let mut ids = Vec::with_capacity(len);
        let mut names = Vec::with_capacity(len);
        let mut cities = Vec::with_capacity(len);
        let mut states = Vec::with_capacity(len);
        let mut latitudes = Vec::with_capacity(len);
        let mut longitudes = Vec::with_capacity(len);
        let mut city_keys = Vec::with_capacity(len);

        for (record, state) in kept {
            let id = match record.id {
                Some(id) => id,
                None => fresh_ids.next().ok_or(DataError::IdSpaceExhausted)?,
            };
            ids.push(id);
            city_keys.push(normalize_city(&record.city));
            names.push(record.name.trim().to_string());
            cities.push(record.city.trim().to_string());
            states.push(state.as_str());
            latitudes.push(record.latitude);
            longitudes.push(record.longitude);
        }
        report.created = ids.len();

        let df = df!(
            ID_COL => ids,
            NAME_COL => names,
            CITY_COL => cities,
            STATE_COL => states,
            LATITUDE_COL => latitudes,
            LONGITUDE_COL => longitudes,
            CITY_KEY_COL => city_keys,
        )?;

        info!(
            created = report.created,
            skipped = report.skipped,
            elapsed = ?t_build.elapsed(),
            "Entity table built"
        );
        Ok((Self { df }, report))
    }

    /// Load a JSON array of [`EntityRecord`]s.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<(Self, LoadReport)> {
        let records: Vec<EntityRecord> = serde_json::from_reader(reader)?;
        Self::from_records(records)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<(Self, LoadReport)> {
        let path = path.as_ref();
        info!(path = ?path, "Loading entities from JSON");
        Self::from_json_reader(BufReader::new(File::open(path)?))
    }

    /// Wrap an existing frame, checking it has the table's columns and invariants.
    pub fn from_df(df: DataFrame) -> Result<Self> {
        for (column, dtype) in [
            (ID_COL, DataType::UInt64),
            (NAME_COL, DataType::String),
            (CITY_COL, DataType::String),
            (STATE_COL, DataType::String),
            (LATITUDE_COL, DataType::Float64),
            (LONGITUDE_COL, DataType::Float64),
            (CITY_KEY_COL, DataType::String),
        ] {
            ensure_column(&df, column, &dtype)?;
        }

        let mut ids = HashSet::with_capacity(df.height());
        for id in df.column(ID_COL)?.u64()?.into_no_null_iter() {
            if !ids.insert(id) {
                return Err(DataError::DuplicateId(id));
            }
        }
        // attribute lookups compare the stored code verbatim
        for state in df.column(STATE_COL)?.str()?.into_no_null_iter() {
            if state.parse::<StateCode>()?.as_str() != state {
                return Err(DataError::UnknownState(state.to_string()));
            }
        }
        Ok(Self { df })
    }

    pub fn write_parquet(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let t_write = std::time::Instant::now();
        let mut df = self.df.clone();
        let mut file = File::create(path)?;
        ParquetWriter::new(&mut file).finish(&mut df)?;
        info!(path = ?path, rows = df.height(), elapsed = ?t_write.elapsed(), "Saved entity table");
        Ok(())
    }

    pub fn read_parquet(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let t_load = std::time::Instant::now();
        let df = ParquetReader::new(File::open(path)?).finish()?;
        info!(path = ?path, rows = df.height(), elapsed = ?t_load.elapsed(), "Loaded entity table");
        Self::from_df(df)
    }

    #[must_use]
    pub fn df(&self) -> &DataFrame {
        &self.df
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.df.height()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// All rows within `radius_m` meters of the point, nearest first.
    ///
    /// The distance is computed once as a column and drives both the filter
    /// and the sort. Equal distances are ordered by id.
    pub fn range_query(&self, latitude: f64, longitude: f64, radius_m: f64) -> Result<DataFrame> {
        let df = self
            .df
            .clone()
            .lazy()
            .with_column(haversine_distance_m(latitude, longitude).alias(DISTANCE_COL))
            .filter(col(DISTANCE_COL).lt_eq(lit(radius_m)))
            .sort(
                [DISTANCE_COL, ID_COL],
                SortMultipleOptions::default().with_maintain_order(true),
            )
            .collect()?;
        Ok(df)
    }

    /// Rows in `state`, optionally restricted to `city`, ordered by name then id.
    ///
    /// City comparison is case-insensitive and ignores surrounding whitespace.
    /// A blank city applies no city restriction.
    pub fn attribute_query(&self, state: StateCode, city: Option<&str>) -> Result<DataFrame> {
        let mut predicate = col(STATE_COL).eq(lit(state.as_str()));
        if let Some(city) = city.map(normalize_city).filter(|c| !c.is_empty()) {
            predicate = predicate.and(col(CITY_KEY_COL).eq(lit(city)));
        }
        let df = self
            .df
            .clone()
            .lazy()
            .filter(predicate)
            .sort(
                [NAME_COL, ID_COL],
                SortMultipleOptions::default().with_maintain_order(true),
            )
            .collect()?;
        Ok(df)
    }
}

fn ensure_column(df: &DataFrame, column: &'static str, expected: &DataType) -> Result<()> {
    let found = df.column(column)?;
    if found.dtype() != expected {
        return Err(DataError::ColumnType {
            column,
            expected: expected.clone(),
            found: found.dtype().clone(),
        });
    }
    if found.null_count() > 0 {
        return Err(DataError::NullValues(column));
    }
    Ok(())
}

fn squared(expr: Expr) -> Expr {
    expr.clone() * expr
}

/// Haversine great-circle distance in meters from a fixed point to each row.
fn haversine_distance_m(latitude: f64, longitude: f64) -> Expr {
    let lat1 = latitude * DEG_TO_RAD;
    let lat2 = col(LATITUDE_COL) * lit(DEG_TO_RAD);
    let half_dlat = (lat2.clone() - lit(lat1)) / lit(2.0);
    let half_dlon = (col(LONGITUDE_COL) - lit(longitude)) * lit(DEG_TO_RAD / 2.0);

    let a = squared(half_dlat.sin()) + lit(lat1.cos()) * lat2.cos() * squared(half_dlon.sin());
    // rounding can push sqrt(a) a hair above 1 for antipodal points
    let root = a.sqrt();
    let root = when(root.clone().gt(lit(1.0)))
        .then(lit(1.0))
        .otherwise(root);

    lit(2.0 * EARTH_MEAN_RADIUS_M) * root.arcsin()
}
