//! Circle-circle collision queries
//!
//! A linear scan is plenty for a few dozen entities. The query returns the
//! FIRST overlapping entity in registration order, not the closest one, so
//! results are reproducible for a given spawn history.

use glam::Vec2;

use super::entity::{Category, Entity, EntityId};
use super::registry::EntityRegistry;

/// Whether two circles overlap (touching counts)
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let reach = ra + rb;
    a.distance_squared(b) <= reach * reach
}

/// First live entity of `category` overlapping entity `id`
///
/// Skips `id` itself. Returns `None` if `id` is not live.
pub fn first_overlap(registry: &EntityRegistry, id: EntityId, category: Category) -> Option<EntityId> {
    let subject = registry.get(id)?;
    registry
        .of_category(category)
        .filter(|other| other.id != id)
        .find(|other| circles_overlap(subject.pos, subject.radius, other.pos, other.radius))
        .map(|other| other.id)
}

/// First overlap matching an extra predicate (e.g. "not my own bullet")
pub fn first_overlap_where<F>(
    registry: &EntityRegistry,
    id: EntityId,
    category: Category,
    mut accept: F,
) -> Option<EntityId>
where
    F: FnMut(&Entity) -> bool,
{
    let subject = registry.get(id)?;
    registry
        .of_category(category)
        .filter(|other| other.id != id)
        .filter(|other| circles_overlap(subject.pos, subject.radius, other.pos, other.radius))
        .find(|other| accept(other))
        .map(|other| other.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::EntityKind;
    use crate::sim::saucer::{Saucer, SaucerSize};

    fn saucer_kind() -> EntityKind {
        EntityKind::Saucer(Saucer::new(SaucerSize::Large))
    }

    #[test]
    fn test_overlap_uses_summed_radii() {
        assert!(circles_overlap(Vec2::ZERO, 3.0, Vec2::new(5.0, 0.0), 2.0));
        assert!(!circles_overlap(Vec2::ZERO, 3.0, Vec2::new(5.1, 0.0), 2.0));
    }

    #[test]
    fn test_first_overlap_filters_category_and_self() {
        let mut reg = EntityRegistry::new();
        let a = reg.spawn(Vec2::ZERO, Vec2::ZERO, 5.0, false, EntityKind::Generic);
        let _generic = reg.spawn(Vec2::new(1.0, 0.0), Vec2::ZERO, 5.0, false, EntityKind::Generic);
        let saucer = reg.spawn(Vec2::new(8.0, 0.0), Vec2::ZERO, 5.0, false, saucer_kind());

        assert_eq!(first_overlap(&reg, a, Category::Saucer), Some(saucer));
        assert_ne!(first_overlap(&reg, a, Category::Generic), Some(a));
    }

    #[test]
    fn test_first_overlap_is_registration_order_not_closest() {
        let mut reg = EntityRegistry::new();
        let a = reg.spawn(Vec2::ZERO, Vec2::ZERO, 5.0, false, EntityKind::Generic);
        let far = reg.spawn(Vec2::new(9.0, 0.0), Vec2::ZERO, 5.0, false, saucer_kind());
        let _near = reg.spawn(Vec2::new(1.0, 0.0), Vec2::ZERO, 5.0, false, saucer_kind());

        assert_eq!(first_overlap(&reg, a, Category::Saucer), Some(far));
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let mut reg = EntityRegistry::new();
        let a = reg.spawn(Vec2::new(100.0, 100.0), Vec2::ZERO, 10.0, false, EntityKind::Generic);
        let b = reg.spawn(Vec2::new(112.0, 105.0), Vec2::ZERO, 4.0, false, saucer_kind());

        assert_eq!(first_overlap(&reg, a, Category::Saucer), Some(b));
        assert_eq!(first_overlap(&reg, b, Category::Generic), Some(a));
    }

    #[test]
    fn test_missing_subject_has_no_overlap() {
        let reg = EntityRegistry::new();
        assert_eq!(first_overlap(&reg, EntityId(42), Category::Generic), None);
    }
}
