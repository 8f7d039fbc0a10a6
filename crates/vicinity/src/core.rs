//! Core proximity search functionality.
//!
//! [`ProximitySearcher`] ties together the radius expansion controller, the
//! spatial executor and the attribute search over one [`SpatialStore`].
//!
//! # Quick Start
//!
//! ```rust
//! use vicinity::{ProximitySearcher, SearchRequest, data::test_data::sample_table};
//!
//! let searcher = ProximitySearcher::from_table(sample_table()?);
//!
//! // Nearest entities around a point, widening the radius until something is found
//! let result = searcher.search(&SearchRequest::near(40.0, -73.0))?;
//! assert_eq!(result.radius_used_km, 1);
//!
//! // Point and locality together, merged without duplicates
//! let result = searcher.search(&SearchRequest::near(40.0, -73.0).in_state("IL"))?;
//! assert_eq!(result.len(), 4);
//! # Ok::<(), vicinity::error::VicinityError>(())
//! ```

use std::path::Path;

use rayon::prelude::*;
use tracing::{info, instrument};
use vicinity_data::EntityTable;

use crate::{
    entity::{Entity, GeoPoint},
    error::VicinityError,
    request::{SearchParams, SearchRequest},
    search::{
        AttributeSearch, Expansion, RadiusExpansionController, RadiusQuery, SearchConfig,
        SearchContext, SearchResult, SpatialQueryExecutor, merge_results,
    },
    store::{FrameStore, SpatialStore},
};

/// The main entry point for proximity and locality searches.
///
/// Holds only read-only state, so a single searcher can be shared across
/// threads and serve any number of concurrent searches.
///
/// # Examples
///
/// With custom configuration:
/// ```rust
/// use vicinity::{ProximitySearcher, SearchConfig, SearchRequest, data::test_data::sample_table};
///
/// let config = SearchConfig::builder().steps_km([1, 50]).build()?;
/// let searcher = ProximitySearcher::from_table(sample_table()?).with_config(config)?;
///
/// // Halfway between two entities ~28 km either side: 2 and 2+1 find nothing, 2+50 finds both
/// let result = searcher.search(&SearchRequest::near(40.25, -73.0).radius_km(2))?;
/// assert_eq!(result.radius_used_km, 52);
/// assert_eq!(result.len(), 2);
/// # Ok::<(), vicinity::error::VicinityError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ProximitySearcher<S = FrameStore> {
    store: S,
    controller: RadiusExpansionController,
    config: SearchConfig,
}

impl ProximitySearcher<FrameStore> {
    #[must_use]
    pub fn from_table(table: EntityTable) -> Self {
        Self::new(FrameStore::new(table))
    }

    /// Load entity records from a JSON array and index them.
    #[instrument(name = "Create ProximitySearcher from JSON", level = "info", skip_all)]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, VicinityError> {
        let t_init = std::time::Instant::now();
        let (store, _report) = FrameStore::from_json_file(path)?;
        info!(
            elapsed_seconds = ?t_init.elapsed(),
            entities = store.table().len(),
            "ProximitySearcher initialization complete"
        );
        Ok(Self::new(store))
    }

    /// Open a table previously written with
    /// [`EntityTable::write_parquet`](vicinity_data::EntityTable::write_parquet).
    #[instrument(name = "Create ProximitySearcher from Parquet", level = "info", skip_all)]
    pub fn from_parquet(path: impl AsRef<Path>) -> Result<Self, VicinityError> {
        let t_init = std::time::Instant::now();
        let store = FrameStore::read_parquet(path)?;
        info!(
            elapsed_seconds = ?t_init.elapsed(),
            entities = store.table().len(),
            "ProximitySearcher initialization complete"
        );
        Ok(Self::new(store))
    }
}

impl<S: SpatialStore> ProximitySearcher<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            controller: RadiusExpansionController::default(),
            config: SearchConfig::default(),
        }
    }

    /// Replace the search configuration.
    ///
    /// The configuration is validated the same way [`SearchConfig::builder`]
    /// validates it, so hand-assembled configs cannot slip through.
    pub fn with_config(mut self, config: SearchConfig) -> Result<Self, VicinityError> {
        config.validate()?;
        self.controller = RadiusExpansionController::new(config.steps_km.clone());
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // === Low-level searches ===

    /// Entities within exactly `radius_km` of `center`, nearest first. No
    /// widening.
    pub fn find_within_radius(
        &self,
        center: GeoPoint,
        radius_km: u32,
    ) -> Result<Vec<Entity>, VicinityError> {
        SpatialQueryExecutor::new(&self.store)
            .find_within_radius(center, radius_km, &SearchContext::new())
            .map_err(From::from)
    }

    /// Entities in `state`, optionally narrowed to `city`.
    ///
    /// Without a usable state code this finds nothing rather than failing.
    pub fn find_by_location(
        &self,
        city: Option<&str>,
        state: Option<&str>,
    ) -> Result<Vec<Entity>, VicinityError> {
        self.attribute_search()
            .find_by_location(city, state)
            .map_err(From::from)
    }

    /// Widen the radius around `center` until something is found.
    pub fn search_incrementally(
        &self,
        center: Option<GeoPoint>,
        requested_radius_km: u32,
    ) -> Result<Expansion, VicinityError> {
        self.search_incrementally_with_context(
            center,
            requested_radius_km,
            &SearchContext::new(),
        )
    }

    pub fn search_incrementally_with_context(
        &self,
        center: Option<GeoPoint>,
        requested_radius_km: u32,
        ctx: &SearchContext,
    ) -> Result<Expansion, VicinityError> {
        self.controller
            .search_incrementally(
                &SpatialQueryExecutor::new(&self.store),
                center,
                requested_radius_km,
                ctx,
            )
            .map_err(From::from)
    }

    // === High-level searches ===

    /// Run the radius search and the locality search a request asks for, and
    /// merge their results.
    ///
    /// Either half is skipped when its inputs are absent, so a request with
    /// neither a center nor a state returns an empty result. Use
    /// [`SearchRequest::validate`] beforehand to reject such requests instead.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResult, VicinityError> {
        self.search_with_context(request, &SearchContext::new())
    }

    #[instrument(name = "Proximity Search", level = "info", skip_all)]
    pub fn search_with_context(
        &self,
        request: &SearchRequest,
        ctx: &SearchContext,
    ) -> Result<SearchResult, VicinityError> {
        let t_search = std::time::Instant::now();

        let expansion = self.controller.search_incrementally(
            &SpatialQueryExecutor::new(&self.store),
            request.center,
            request.initial_radius_km,
            ctx,
        )?;

        ctx.check()?;
        let by_location = self
            .attribute_search()
            .find_by_location(request.city.as_deref(), request.state.as_deref())?;

        let entities = merge_results(expansion.entities, by_location);
        info!(
            elapsed_seconds = ?t_search.elapsed(),
            radius_used_km = expansion.radius_used_km,
            found = entities.len(),
            "Search complete"
        );

        Ok(SearchResult {
            entities,
            radius_used_km: expansion.radius_used_km,
        })
    }

    /// Parse raw parameters, substituting the configured default radius, and
    /// search.
    pub fn search_params(&self, params: &SearchParams) -> Result<SearchResult, VicinityError> {
        let request = params.parse_with_default_radius(self.config.default_radius_km)?;
        self.search(&request)
    }

    /// Run many independent searches in parallel. Results keep the order of
    /// `requests`; the first failure fails the batch.
    #[instrument(name = "Bulk Proximity Search", level = "info", skip_all, fields(batch_size = requests.len()))]
    pub fn search_bulk(&self, requests: &[SearchRequest]) -> Result<Vec<SearchResult>, VicinityError> {
        let t_search = std::time::Instant::now();
        let results = requests
            .par_iter()
            .map(|request| self.search(request))
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            elapsed_seconds = ?t_search.elapsed(),
            "Bulk search complete"
        );
        Ok(results)
    }

    fn attribute_search(&self) -> AttributeSearch<'_, S> {
        AttributeSearch::new(&self.store).post_filter(self.config.post_filter_attributes)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vicinity_data::test_data::{offset_north, ring_records, sample_table};

    use super::*;
    use crate::search::SearchError;

    const CENTER: GeoPoint = GeoPoint::new(40.0, -73.0);

    fn searcher() -> ProximitySearcher {
        ProximitySearcher::from_table(sample_table().unwrap())
    }

    fn ids(result: &SearchResult) -> Vec<u64> {
        result.ids().map(|id| id.0).collect()
    }

    #[test]
    fn test_radius_only() {
        let result = searcher().search(&SearchRequest::near(40.0, -73.0)).unwrap();
        assert_eq!(result.radius_used_km, 1);
        assert_eq!(ids(&result), vec![1]);
    }

    #[test]
    fn test_locality_only() {
        let result = searcher()
            .search(&SearchRequest::in_locality(Some("springfield"), "IL"))
            .unwrap();
        assert_eq!(result.radius_used_km, 0);
        assert_eq!(ids(&result), vec![4, 3]);
    }

    #[test]
    fn test_combined_is_union_without_duplicates() {
        let searcher = searcher();
        // Seaside is in NY, so the radius hit is also a locality hit
        let result = searcher
            .search(&SearchRequest::near(40.0, -73.0).in_city("Seaside").in_state("NY"))
            .unwrap();
        assert_eq!(ids(&result), vec![1]);

        let result = searcher
            .search(&SearchRequest::near(40.0, -73.0).in_state("IL"))
            .unwrap();
        assert_eq!(ids(&result), vec![1, 4, 3, 5]);
    }

    #[test]
    fn test_underspecified_request_finds_nothing() {
        let result = searcher().search(&SearchRequest::default()).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.radius_used_km, 0);
    }

    #[test]
    fn test_zero_coordinate_skips_radius_search() {
        let result = searcher()
            .search(&SearchRequest::near(0.0, -73.0).in_state("MO"))
            .unwrap();
        assert_eq!(result.radius_used_km, 0);
        assert_eq!(ids(&result), vec![8]);
    }

    #[test]
    fn test_custom_steps() {
        let origin = (40.0, -73.0);
        let table = vicinity_data::EntityTable::from_records(ring_records(origin, &[30.0]))
            .unwrap()
            .0;
        let config = SearchConfig::builder().steps_km([40]).build().unwrap();
        let searcher = ProximitySearcher::from_table(table).with_config(config).unwrap();

        let expansion = searcher.search_incrementally(Some(CENTER), 1).unwrap();
        assert_eq!(expansion.radius_used_km, 40);
        assert_eq!(searcher.config().steps_km, vec![40]);
    }

    #[test]
    fn test_search_params_uses_configured_default_radius() {
        let (lat, lon) = offset_north((40.0, -73.0), -3.0);
        let config = SearchConfig::builder()
            .steps_km([100])
            .default_radius_km(4)
            .build()
            .unwrap();
        let searcher = searcher().with_config(config).unwrap();
        let params = SearchParams {
            lat: Some(lat.to_string()),
            lon: Some(lon.to_string()),
            radius_km: Some("four".to_string()),
            ..SearchParams::default()
        };

        let result = searcher.search_params(&params).unwrap();
        assert_eq!(result.radius_used_km, 4);
        assert_eq!(ids(&result), vec![1]);
    }

    #[test]
    fn test_with_config_rejects_invalid_config() {
        let config = SearchConfig {
            steps_km: Vec::new(),
            ..SearchConfig::default()
        };
        assert!(matches!(
            searcher().with_config(config),
            Err(VicinityError::ConfigError(_))
        ));

        let config = SearchConfig {
            steps_km: vec![5, 0],
            ..SearchConfig::default()
        };
        assert!(searcher().with_config(config).is_err());
    }

    #[test]
    fn test_search_params_errors() {
        let err = searcher().search_params(&SearchParams::default()).unwrap_err();
        assert!(matches!(err, VicinityError::UnderspecifiedQuery));
    }

    #[test]
    fn test_cancelled_search() {
        let ctx = SearchContext::new();
        ctx.cancel();
        let err = searcher()
            .search_with_context(&SearchRequest::near(40.0, -73.0), &ctx)
            .unwrap_err();
        assert!(matches!(err, VicinityError::SearchError(SearchError::Cancelled)));
    }

    #[test]
    fn test_bulk_preserves_order() {
        let requests = vec![
            SearchRequest::in_locality(None, "MO"),
            SearchRequest::near(40.0, -73.0),
            SearchRequest::in_locality(None, "CA"),
        ];
        let results = searcher().search_bulk(&requests).unwrap();
        let ids: Vec<Vec<u64>> = results.iter().map(ids).collect();
        assert_eq!(ids, vec![vec![8], vec![1], vec![7]]);
    }

    #[test]
    fn test_shared_store() {
        let store = Arc::new(FrameStore::new(sample_table().unwrap()));
        let searcher = ProximitySearcher::new(Arc::clone(&store));
        let found = searcher.find_by_location(None, Some("ca")).unwrap();
        assert_eq!(found.len(), 1);
        let found = searcher.find_within_radius(CENTER, 1).unwrap();
        assert_eq!(found.len(), 1);
    }
}
