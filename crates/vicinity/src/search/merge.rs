use ahash::AHashSet as HashSet;

use crate::entity::Entity;

/// Union of radius and attribute results, each entity kept once by id.
///
/// The result is a set: no ordering is imposed beyond first appearance, which
/// leaves the radius results in their distance order ahead of any
/// locality-only matches.
#[must_use]
pub fn merge_results(radius_results: Vec<Entity>, attribute_results: Vec<Entity>) -> Vec<Entity> {
    let mut seen = HashSet::with_capacity(radius_results.len() + attribute_results.len());
    radius_results
        .into_iter()
        .chain(attribute_results)
        .filter(|entity| seen.insert(entity.id))
        .collect()
}
