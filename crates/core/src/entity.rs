//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// A product keeps its identity while its name, price and photo change, so
/// lookups and updates go through this id rather than field equality.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}

/// Find the position of the entity with `id` in an ordered slice.
pub fn position_of<E: Entity>(items: &[E], id: E::Id) -> Option<usize> {
    items.iter().position(|item| item.id() == id)
}
