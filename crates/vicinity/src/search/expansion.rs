//! Incremental radius expansion.
//!
//! Starting from a requested radius, widen the search in fixed additive steps
//! until some radius yields matches or the steps run out. The first non-empty
//! radius wins, so a search costs at most `steps + 1` range queries.

use std::{iter, sync::Arc};

use tracing::{debug, info, instrument};

use super::{Result, SearchContext};
use crate::entity::{Entity, GeoPoint};

/// One range lookup at a fixed radius. Implemented by
/// [`SpatialQueryExecutor`](super::SpatialQueryExecutor).
pub trait RadiusQuery {
    fn find_within_radius(
        &self,
        center: GeoPoint,
        radius_km: u32,
        ctx: &SearchContext,
    ) -> Result<Vec<Entity>>;
}

/// What an expansion settled on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expansion {
    /// Radius that produced `entities`, or 0 when nothing was found
    pub radius_used_km: u32,
    /// Nearest first
    pub entities: Vec<Entity>,
}

impl Expansion {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Owns the radius growth policy. Holds only the read-only step sequence, so
/// one controller serves any number of concurrent searches.
#[derive(Debug, Clone)]
pub struct RadiusExpansionController {
    steps_km: Arc<[u32]>,
}

impl RadiusExpansionController {
    pub fn new(steps_km: impl Into<Arc<[u32]>>) -> Self {
        Self {
            steps_km: steps_km.into(),
        }
    }

    #[must_use]
    pub fn steps_km(&self) -> &[u32] {
        &self.steps_km
    }

    /// Radii to try, in order.
    ///
    /// A request above 1 km yields `[R, R + s0, R + s1, ...]`, each step added
    /// to `R` itself rather than to the previous candidate. Anything else uses
    /// the steps verbatim.
    #[must_use]
    pub fn candidate_radii(&self, requested_radius_km: u32) -> Vec<u32> {
        if requested_radius_km > 1 {
            iter::once(requested_radius_km)
                .chain(
                    self.steps_km
                        .iter()
                        .map(|step| requested_radius_km.saturating_add(*step)),
                )
                .collect()
        } else {
            self.steps_km.to_vec()
        }
    }

    /// Query `executor` at growing radii until one returns matches.
    ///
    /// A missing center, or one with a zero coordinate, is not a radius search
    /// at all and returns an empty expansion without querying. Executor errors,
    /// cancellation and deadline expiry end the search immediately.
    #[instrument(name = "Radius Expansion", level = "debug", skip(self, executor, ctx))]
    pub fn search_incrementally<Q>(
        &self,
        executor: &Q,
        center: Option<GeoPoint>,
        requested_radius_km: u32,
        ctx: &SearchContext,
    ) -> Result<Expansion>
    where
        Q: RadiusQuery + ?Sized,
    {
        let Some(center) = center.filter(|c| !c.is_unset()) else {
            debug!("No usable center, skipping radius search");
            return Ok(Expansion::empty());
        };

        for radius_km in self.candidate_radii(requested_radius_km) {
            ctx.check()?;
            let entities = executor.find_within_radius(center, radius_km, ctx)?;
            if !entities.is_empty() {
                info!(
                    radius_km,
                    found = entities.len(),
                    "Found entities within radius"
                );
                return Ok(Expansion {
                    radius_used_km: radius_km,
                    entities,
                });
            }
            debug!(radius_km, "Nothing within radius, widening");
        }

        debug!("Exhausted candidate radii");
        Ok(Expansion::empty())
    }
}

impl Default for RadiusExpansionController {
    fn default() -> Self {
        Self::new(super::DEFAULT_RADIUS_STEPS_KM.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use proptest::prelude::*;
    use vicinity_data::StateCode;

    use super::*;
    use crate::{entity::EntityId, search::SearchError};

    /// Returns an entity once the radius reaches `hit_at_km`, recording every call.
    struct FakeExecutor {
        hit_at_km: Option<u32>,
        calls: RefCell<Vec<u32>>,
        cancel_after_call: Option<SearchContext>,
    }

    impl FakeExecutor {
        fn hitting_at(hit_at_km: Option<u32>) -> Self {
            Self {
                hit_at_km,
                calls: RefCell::new(Vec::new()),
                cancel_after_call: None,
            }
        }

        fn calls(&self) -> Vec<u32> {
            self.calls.borrow().clone()
        }
    }

    impl RadiusQuery for FakeExecutor {
        fn find_within_radius(
            &self,
            center: GeoPoint,
            radius_km: u32,
            _ctx: &SearchContext,
        ) -> Result<Vec<Entity>> {
            self.calls.borrow_mut().push(radius_km);
            if let Some(ctx) = &self.cancel_after_call {
                ctx.cancel();
            }
            Ok(match self.hit_at_km {
                Some(hit) if radius_km >= hit => vec![Entity {
                    id: EntityId(u64::from(radius_km)),
                    name: "Hit".to_string(),
                    city: "Town".to_string(),
                    state: StateCode::NY,
                    location: center,
                }],
                _ => Vec::new(),
            })
        }
    }

    const CENTER: GeoPoint = GeoPoint::new(40.0, -73.0);
    const DEFAULT_STEPS: [u32; 6] = crate::search::DEFAULT_RADIUS_STEPS_KM;

    fn controller() -> RadiusExpansionController {
        RadiusExpansionController::default()
    }

    #[test]
    fn test_candidates_for_larger_request_are_additive() {
        assert_eq!(
            controller().candidate_radii(2),
            vec![2, 3, 7, 12, 27, 52, 102]
        );
    }

    #[test]
    fn test_candidates_for_small_request_are_steps() {
        let expected = DEFAULT_STEPS.to_vec();
        assert_eq!(controller().candidate_radii(0), expected);
        assert_eq!(controller().candidate_radii(1), expected);
    }

    #[test]
    fn test_missing_center_skips_executor() {
        let executor = FakeExecutor::hitting_at(Some(1));
        let ctx = SearchContext::new();

        for center in [
            None,
            Some(GeoPoint::new(0.0, -73.0)),
            Some(GeoPoint::new(40.0, 0.0)),
        ] {
            let found = controller()
                .search_incrementally(&executor, center, 5, &ctx)
                .unwrap();
            assert_eq!(found, Expansion::empty());
        }
        assert!(executor.calls().is_empty());
    }

    #[test]
    fn test_stops_at_first_hit() {
        let executor = FakeExecutor::hitting_at(Some(10));
        let found = controller()
            .search_incrementally(&executor, Some(CENTER), 1, &SearchContext::new())
            .unwrap();

        assert_eq!(found.radius_used_km, 10);
        assert_eq!(found.entities.len(), 1);
        assert_eq!(executor.calls(), vec![1, 5, 10]);
    }

    #[test]
    fn test_requested_radius_hit_first_try() {
        let executor = FakeExecutor::hitting_at(Some(1));
        let found = controller()
            .search_incrementally(&executor, Some(CENTER), 30, &SearchContext::new())
            .unwrap();

        assert_eq!(found.radius_used_km, 30);
        assert_eq!(executor.calls(), vec![30]);
    }

    #[test]
    fn test_exhausted_returns_empty() {
        let executor = FakeExecutor::hitting_at(None);
        let found = controller()
            .search_incrementally(&executor, Some(CENTER), 2, &SearchContext::new())
            .unwrap();

        assert_eq!(found, Expansion::empty());
        assert_eq!(executor.calls(), vec![2, 3, 7, 12, 27, 52, 102]);
    }

    #[test]
    fn test_cancellation_stops_widening() {
        let ctx = SearchContext::new();
        let executor = FakeExecutor {
            hit_at_km: None,
            calls: RefCell::new(Vec::new()),
            cancel_after_call: Some(ctx.clone()),
        };

        let err = controller()
            .search_incrementally(&executor, Some(CENTER), 1, &ctx)
            .unwrap_err();
        assert!(matches!(err, SearchError::Cancelled));
        assert_eq!(executor.calls(), vec![1]);
    }

    proptest! {
        #[test]
        fn prop_candidate_construction(
            requested in 0u32..10_000,
            steps in prop::collection::vec(1u32..1_000, 1..10),
        ) {
            let controller = RadiusExpansionController::new(steps.clone());
            let candidates = controller.candidate_radii(requested);

            if requested > 1 {
                prop_assert_eq!(candidates.len(), steps.len() + 1);
                prop_assert_eq!(candidates[0], requested);
                for (candidate, step) in candidates[1..].iter().zip(&steps) {
                    prop_assert_eq!(*candidate, requested + step);
                }
            } else {
                prop_assert_eq!(candidates, steps);
            }
        }

        #[test]
        fn prop_never_queries_past_first_hit(hit in 1u32..200, requested in 0u32..50) {
            let executor = FakeExecutor::hitting_at(Some(hit));
            let controller = controller();
            let found = controller
                .search_incrementally(&executor, Some(CENTER), requested, &SearchContext::new())
                .unwrap();

            let calls = executor.calls();
            prop_assert!(calls.len() <= controller.steps_km().len() + 1);
            if found.radius_used_km == 0 {
                prop_assert_eq!(calls, controller.candidate_radii(requested));
            } else {
                prop_assert_eq!(calls.last().copied(), Some(found.radius_used_km));
                prop_assert!(calls[..calls.len() - 1].iter().all(|r| *r < hit));
            }
        }
    }
}
