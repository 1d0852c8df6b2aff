//! Core types for the codec.

/// A simulation tick number.
///
/// Frames recorded before the match starts carry [`Tick::PREGAME`]; all other
/// ticks are non-negative and non-decreasing through a demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Tick(i32);

impl Tick {
    /// Tick assigned to pre-game (signon) data.
    pub const PREGAME: Self = Self(-1);

    /// Creates a new tick.
    #[must_use]
    pub const fn new(tick: i32) -> Self {
        Self(tick)
    }

    /// Maps a frame tick field to a tick, treating `u32::MAX` as pre-game.
    #[must_use]
    pub const fn from_frame(raw: u32) -> Self {
        if raw == wire::PREGAME_TICK {
            return Self::PREGAME;
        }
        if raw > i32::MAX as u32 {
            return Self(i32::MAX);
        }
        Self(raw as i32)
    }

    /// Returns the raw tick value.
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Returns `true` for the pre-game tick.
    #[must_use]
    pub const fn is_pregame(self) -> bool {
        self.0 < 0
    }
}

impl From<i32> for Tick {
    fn from(tick: i32) -> Self {
        Self(tick)
    }
}

impl From<Tick> for i32 {
    fn from(tick: Tick) -> Self {
        tick.0
    }
}

/// Index of an entity slot.
///
/// Indices are reused: a slot freed by a destroy may be taken by a later
/// create. Pair the index with a [`Generation`] to name one entity lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EntityIndex(u32);

impl EntityIndex {
    /// Creates a new entity index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for EntityIndex {
    fn from(index: u32) -> Self {
        Self(index)
    }
}

impl From<EntityIndex> for u32 {
    fn from(index: EntityIndex) -> Self {
        index.0
    }
}

/// Identifies one lifetime of an entity slot.
///
/// Every create gets a fresh generation, so `(index, generation)` never
/// aliases a previous occupant of the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u32);

impl Generation {
    #[must_use]
    pub const fn new(generation: u32) -> Self {
        Self(generation)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Entity handle as stored in handle-typed properties and event keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityHandle(u32);

impl EntityHandle {
    /// Raw value of a handle that points nowhere.
    pub const NULL: u32 = 0x00FF_FFFF;

    /// Low bits of a handle that carry the entity index.
    pub const INDEX_MASK: u32 = 0x3FFF;

    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == Self::NULL
    }

    /// Returns the entity index the handle points at, if any.
    #[must_use]
    pub const fn index(self) -> Option<EntityIndex> {
        if self.is_null() {
            None
        } else {
            Some(EntityIndex(self.0 & Self::INDEX_MASK))
        }
    }

    /// Builds a handle for `index` with the given serial in the high bits.
    #[must_use]
    pub const fn for_index(index: EntityIndex, serial: u32) -> Self {
        Self((serial << 14) | (index.0 & Self::INDEX_MASK))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pregame_tick_from_frame() {
        assert_eq!(Tick::from_frame(u32::MAX), Tick::PREGAME);
        assert!(Tick::PREGAME.is_pregame());
        assert_eq!(Tick::from_frame(64).raw(), 64);
        assert!(!Tick::from_frame(0).is_pregame());
    }

    #[test]
    fn oversized_frame_tick_saturates() {
        assert_eq!(Tick::from_frame(u32::MAX - 1).raw(), i32::MAX);
    }

    #[test]
    fn tick_ordering() {
        assert!(Tick::PREGAME < Tick::new(0));
        assert!(Tick::new(1) < Tick::new(2));
    }

    #[test]
    fn entity_index_conversions() {
        let index: EntityIndex = 42u32.into();
        assert_eq!(index.raw(), 42);
        let raw: u32 = index.into();
        assert_eq!(raw, 42);
    }

    #[test]
    fn handle_masks_index() {
        let handle = EntityHandle::for_index(EntityIndex::new(5), 3);
        assert_eq!(handle.index(), Some(EntityIndex::new(5)));
        assert_eq!(handle.raw(), (3 << 14) | 5);
        assert!(!handle.is_null());
    }

    #[test]
    fn null_handle_has_no_index() {
        let handle = EntityHandle::from_raw(EntityHandle::NULL);
        assert!(handle.is_null());
        assert_eq!(handle.index(), None);
    }
}
