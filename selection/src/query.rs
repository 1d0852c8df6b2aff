//! Caller-facing filters.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// Which events to decode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EventFilter {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl EventFilter {
    /// Filter for a single event name.
    #[must_use]
    pub fn one(name: impl Into<String>) -> Self {
        Self::Only(BTreeSet::from([name.into()]))
    }

    #[must_use]
    pub fn wants(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(names) => names.contains(name),
        }
    }

    /// Requested names that `known` does not contain, in sorted order.
    pub fn missing(&self, known: impl Fn(&str) -> bool) -> Vec<String> {
        match self {
            Self::All => Vec::new(),
            Self::Only(names) => names
                .iter()
                .filter(|name| !known(name.as_str()))
                .cloned()
                .collect(),
        }
    }
}

impl<S: Into<String>> FromIterator<S> for EventFilter {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::Only(iter.into_iter().map(Into::into).collect())
    }
}

/// Which ticks produce rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TickFilter {
    #[default]
    All,
    Set(BTreeSet<i32>),
    Range(RangeInclusive<i32>),
}

impl TickFilter {
    #[must_use]
    pub fn contains(&self, tick: i32) -> bool {
        match self {
            Self::All => true,
            Self::Set(ticks) => ticks.contains(&tick),
            Self::Range(range) => range.contains(&tick),
        }
    }

    /// Returns `true` once no tick at or after `tick` can match.
    #[must_use]
    pub fn exhausted_after(&self, tick: i32) -> bool {
        match self {
            Self::All => false,
            Self::Set(ticks) => ticks.last().map_or(true, |last| tick >= *last),
            Self::Range(range) => tick >= *range.end(),
        }
    }
}

/// Which players produce rows, by steam id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PlayerFilter {
    #[default]
    All,
    SteamIds(BTreeSet<u64>),
}

impl PlayerFilter {
    /// Players whose steam id is not yet known only match [`PlayerFilter::All`].
    #[must_use]
    pub fn contains(&self, steam_id: Option<u64>) -> bool {
        match self {
            Self::All => true,
            Self::SteamIds(ids) => steam_id.is_some_and(|id| ids.contains(&id)),
        }
    }
}

/// Arguments of the event operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    pub events: EventFilter,
    /// Player properties attached for every player key of an event.
    pub player_props: Vec<String>,
    /// Game-rules properties attached to every event.
    pub other_props: Vec<String>,
}

impl EventQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(mut self, events: EventFilter) -> Self {
        self.events = events;
        self
    }

    #[must_use]
    pub fn player_props<S: Into<String>>(mut self, props: impl IntoIterator<Item = S>) -> Self {
        self.player_props = props.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn other_props<S: Into<String>>(mut self, props: impl IntoIterator<Item = S>) -> Self {
        self.other_props = props.into_iter().map(Into::into).collect();
        self
    }
}

/// Arguments of the tick operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickQuery {
    pub props: Vec<String>,
    pub ticks: TickFilter,
    pub players: PlayerFilter,
    /// Column-oriented output instead of rows.
    pub struct_of_arrays: bool,
}

impl TickQuery {
    #[must_use]
    pub fn new<S: Into<String>>(props: impl IntoIterator<Item = S>) -> Self {
        Self {
            props: props.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn ticks(mut self, ticks: TickFilter) -> Self {
        self.ticks = ticks;
        self
    }

    #[must_use]
    pub fn players(mut self, players: PlayerFilter) -> Self {
        self.players = players;
        self
    }

    #[must_use]
    pub const fn struct_of_arrays(mut self, enabled: bool) -> Self {
        self.struct_of_arrays = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_filter_membership() {
        let filter: EventFilter = ["round_end", "player_death"].into_iter().collect();
        assert!(filter.wants("round_end"));
        assert!(!filter.wants("bomb_planted"));
        assert!(EventFilter::All.wants("anything"));
    }

    #[test]
    fn missing_event_names_are_sorted() {
        let filter: EventFilter = ["zeta", "round_end", "alpha"].into_iter().collect();
        let missing = filter.missing(|name| name == "round_end");
        assert_eq!(missing, vec!["alpha".to_string(), "zeta".to_string()]);
        assert!(EventFilter::All.missing(|_| false).is_empty());
    }

    #[test]
    fn tick_filters() {
        let set = TickFilter::Set(BTreeSet::from([10, 20]));
        assert!(set.contains(10));
        assert!(!set.contains(15));
        assert!(set.exhausted_after(20));
        assert!(!set.exhausted_after(19));

        let range = TickFilter::Range(5..=8);
        assert!(range.contains(5) && range.contains(8));
        assert!(!range.contains(9));
        assert!(range.exhausted_after(8));

        assert!(TickFilter::Set(BTreeSet::new()).exhausted_after(-1));
        assert!(!TickFilter::All.exhausted_after(i32::MAX));
    }

    #[test]
    fn player_filter_needs_known_steam_id() {
        let filter = PlayerFilter::SteamIds(BTreeSet::from([7]));
        assert!(filter.contains(Some(7)));
        assert!(!filter.contains(Some(8)));
        assert!(!filter.contains(None));
        assert!(PlayerFilter::All.contains(None));
    }

    #[test]
    fn builders_fill_fields() {
        let query = EventQuery::new()
            .events(EventFilter::one("round_end"))
            .player_props(["X", "health"])
            .other_props(["total_rounds_played"]);
        assert_eq!(query.player_props, vec!["X", "health"]);
        assert_eq!(query.other_props.len(), 1);

        let ticks = TickQuery::new(["X"]).struct_of_arrays(true);
        assert!(ticks.struct_of_arrays);
        assert_eq!(ticks.ticks, TickFilter::All);
    }
}
