//! Non-fatal problems collected during a parse.

use std::collections::HashSet;
use std::fmt;

/// A problem that did not stop the parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum ParseWarning {
    /// A frame of unknown kind was skipped.
    UnknownFrameKind { kind: u32, offset: usize },
    /// A game event with no usable descriptor was skipped.
    UnknownEventDescriptor { event_id: u32, tick: i32 },
    /// A requested property or event name does not exist in this demo.
    InvalidFilter { item: String },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFrameKind { kind, offset } => {
                write!(f, "skipped unknown frame kind {kind} at byte {offset}")
            }
            Self::UnknownEventDescriptor { event_id, tick } => {
                write!(f, "skipped event {event_id} with no descriptor at tick {tick}")
            }
            Self::InvalidFilter { item } => write!(f, "'{item}' does not exist in this demo"),
        }
    }
}

/// Ordered warning list; filter warnings are recorded once per item.
#[derive(Debug, Default)]
pub(crate) struct Warnings {
    list: Vec<ParseWarning>,
    filters: HashSet<String>,
}

impl Warnings {
    pub(crate) fn push(&mut self, warning: ParseWarning) {
        if let ParseWarning::InvalidFilter { item } = &warning {
            if !self.filters.insert(item.clone()) {
                return;
            }
        }
        log::warn!("{warning}");
        self.list.push(warning);
    }

    pub(crate) fn invalid_filters<'a>(&mut self, items: impl IntoIterator<Item = &'a String>) {
        for item in items {
            self.push(ParseWarning::InvalidFilter { item: item.clone() });
        }
    }

    pub(crate) fn into_vec(self) -> Vec<ParseWarning> {
        self.list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_warnings_are_deduplicated() {
        let mut warnings = Warnings::default();
        let items = vec!["m_bogus".to_string(), "m_bogus".to_string()];
        warnings.invalid_filters(&items);
        warnings.invalid_filters(&items);
        warnings.push(ParseWarning::UnknownEventDescriptor {
            event_id: 4,
            tick: 10,
        });
        warnings.push(ParseWarning::UnknownEventDescriptor {
            event_id: 4,
            tick: 10,
        });
        let list = warnings.into_vec();
        assert_eq!(list.len(), 3);
        assert_eq!(
            list[0],
            ParseWarning::InvalidFilter {
                item: "m_bogus".into()
            }
        );
    }

    #[test]
    fn display_names_the_problem() {
        let warning = ParseWarning::UnknownFrameKind {
            kind: 99,
            offset: 300,
        };
        assert_eq!(warning.to_string(), "skipped unknown frame kind 99 at byte 300");
    }
}
