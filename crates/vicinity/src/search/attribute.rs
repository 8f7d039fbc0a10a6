use tracing::{debug, warn};
use vicinity_data::StateCode;

use super::Result;
use crate::{
    entity::Entity,
    store::{AttributeFilter, SpatialStore},
};

/// City/state lookup, independent of geometry.
///
/// Both attributes compare case-insensitively with surrounding whitespace
/// ignored. A state is required; without one the lookup is considered
/// underspecified and matches nothing.
#[derive(Debug)]
pub struct AttributeSearch<'a, S: ?Sized> {
    store: &'a S,
    post_filter: bool,
}

impl<'a, S: SpatialStore + ?Sized> AttributeSearch<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            post_filter: true,
        }
    }

    /// Whether to drop store results that fall outside the requested
    /// locality. On by default.
    #[must_use]
    pub fn post_filter(mut self, enabled: bool) -> Self {
        self.post_filter = enabled;
        self
    }

    pub fn find_by_location(&self, city: Option<&str>, state: Option<&str>) -> Result<Vec<Entity>> {
        let Some(state) = state.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(Vec::new());
        };
        let Ok(state) = state.parse::<StateCode>() else {
            debug!(state, "Unknown state code, no locality matches");
            return Ok(Vec::new());
        };
        let city = city.map(str::trim).filter(|c| !c.is_empty());

        let mut entities = self
            .store
            .attribute_query(&AttributeFilter { state, city })?;

        if self.post_filter {
            let returned = entities.len();
            entities.retain(|e| e.matches_locality(state, city));
            let dropped = returned - entities.len();
            if dropped > 0 {
                warn!(
                    dropped,
                    %state,
                    city = city.unwrap_or_default(),
                    "Store returned entities outside the requested locality"
                );
            }
        }

        debug!(%state, ?city, found = entities.len(), "Attribute search");
        Ok(entities)
    }
}
