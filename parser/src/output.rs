//! Result shapes handed back to callers.

use codec::PropValue;
use indexmap::IndexMap;

use crate::warning::ParseWarning;

/// One decoded game event occurrence.
///
/// `fields` holds the event's own keys in declaration order, followed by
/// player enrichment and the requested game-rules properties. Enrichment
/// values are `None` when the player or property is not known yet.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GameEvent {
    #[cfg_attr(feature = "serde", serde(rename = "event_name"))]
    pub name: String,
    pub tick: i32,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub fields: IndexMap<String, Option<PropValue>>,
}

impl GameEvent {
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&PropValue> {
        self.fields.get(field).and_then(Option::as_ref)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EventOutput {
    pub events: Vec<GameEvent>,
    pub warnings: Vec<ParseWarning>,
}

/// Identity of one player row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RowIdentity {
    pub tick: i32,
    pub entity_id: u32,
    pub steamid: Option<u64>,
    pub name: Option<String>,
}

/// One player at one tick.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TickRow {
    pub tick: i32,
    pub entity_id: u32,
    pub steamid: Option<u64>,
    pub name: Option<String>,
    /// Requested columns under the names they were asked for.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub values: IndexMap<String, Option<PropValue>>,
}

/// Column-oriented tick data; every vector has the same length.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TickColumns {
    pub tick: Vec<i32>,
    pub entity_id: Vec<u32>,
    pub steamid: Vec<Option<u64>>,
    pub name: Vec<Option<String>>,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub columns: IndexMap<String, Vec<Option<PropValue>>>,
}

impl TickColumns {
    /// Empty columns for the given projected names.
    #[must_use]
    pub fn with_columns(names: &[String]) -> Self {
        Self {
            columns: names.iter().map(|n| (n.clone(), Vec::new())).collect(),
            ..Self::default()
        }
    }

    /// Reshapes rows into columns.
    #[must_use]
    pub fn from_rows(rows: &[TickRow], names: &[String]) -> Self {
        let mut columns = Self::with_columns(names);
        for row in rows {
            columns.tick.push(row.tick);
            columns.entity_id.push(row.entity_id);
            columns.steamid.push(row.steamid);
            columns.name.push(row.name.clone());
            for (name, values) in &mut columns.columns {
                values.push(row.values.get(name).cloned().flatten());
            }
        }
        columns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tick.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tick.is_empty()
    }
}

/// Tick data in the shape the caller asked for.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum TickTable {
    Rows(Vec<TickRow>),
    Columns(TickColumns),
}

impl TickTable {
    pub(crate) fn new(struct_of_arrays: bool, names: &[String]) -> Self {
        if struct_of_arrays {
            Self::Columns(TickColumns::with_columns(names))
        } else {
            Self::Rows(Vec::new())
        }
    }

    /// Appends one row. `values` line up with `names`.
    pub(crate) fn push(
        &mut self,
        names: &[String],
        identity: RowIdentity,
        values: impl IntoIterator<Item = Option<PropValue>>,
    ) {
        match self {
            Self::Rows(rows) => rows.push(TickRow {
                tick: identity.tick,
                entity_id: identity.entity_id,
                steamid: identity.steamid,
                name: identity.name,
                values: names.iter().cloned().zip(values).collect(),
            }),
            Self::Columns(columns) => {
                columns.tick.push(identity.tick);
                columns.entity_id.push(identity.entity_id);
                columns.steamid.push(identity.steamid);
                columns.name.push(identity.name);
                for (name, value) in names.iter().zip(values) {
                    columns
                        .columns
                        .entry(name.clone())
                        .or_default()
                        .push(value);
                }
            }
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Rows(rows) => rows.len(),
            Self::Columns(columns) => columns.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TickOutput {
    pub table: TickTable,
    /// Projected column names, in request order.
    pub columns: Vec<String>,
    pub warnings: Vec<ParseWarning>,
}

impl TickOutput {
    /// The table as columns, reshaping rows if needed.
    #[must_use]
    pub fn into_columns(self) -> TickColumns {
        match self.table {
            TickTable::Columns(columns) => columns,
            TickTable::Rows(rows) => TickColumns::from_rows(&rows, &self.columns),
        }
    }
}

/// Projectile position at the end of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GrenadePoint {
    pub tick: i32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Path of one projectile lifetime.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GrenadeTrajectory {
    pub entity_id: u32,
    /// Projectile class, e.g. `CSmokeGrenadeProjectile`.
    pub grenade_type: String,
    pub created_tick: i32,
    pub thrower_name: Option<String>,
    pub thrower_steamid: Option<u64>,
    pub points: Vec<GrenadePoint>,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GrenadeOutput {
    pub grenades: Vec<GrenadeTrajectory>,
    pub warnings: Vec<ParseWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["X".into(), "health".into()]
    }

    fn identity(tick: i32, entity_id: u32) -> RowIdentity {
        RowIdentity {
            tick,
            entity_id,
            steamid: Some(76_561_198_000_000_001),
            name: Some("s1mple".into()),
        }
    }

    #[test]
    fn rows_and_columns_hold_the_same_values() {
        let mut rows = TickTable::new(false, &names());
        let mut columns = TickTable::new(true, &names());
        for table in [&mut rows, &mut columns] {
            table.push(
                &names(),
                identity(1, 3),
                [Some(PropValue::Float(1.5)), Some(PropValue::UInt(100))],
            );
            table.push(&names(), identity(1, 4), [None, Some(PropValue::UInt(90))]);
        }
        assert_eq!(rows.len(), 2);
        let TickTable::Rows(rows) = rows else {
            panic!("expected rows");
        };
        let TickTable::Columns(columns) = columns else {
            panic!("expected columns");
        };
        assert_eq!(TickColumns::from_rows(&rows, &names()), columns);
        assert_eq!(columns.columns["X"], vec![Some(PropValue::Float(1.5)), None]);
    }

    #[test]
    fn empty_columns_keep_their_names() {
        let output = TickOutput {
            table: TickTable::new(false, &names()),
            columns: names(),
            warnings: Vec::new(),
        };
        let columns = output.into_columns();
        assert!(columns.is_empty());
        assert_eq!(columns.columns.keys().collect::<Vec<_>>(), vec!["X", "health"]);
    }

    #[test]
    fn event_get_skips_missing_values() {
        let mut fields = IndexMap::new();
        fields.insert("winner".to_string(), Some(PropValue::UInt(2)));
        fields.insert("user_name".to_string(), None);
        let event = GameEvent {
            name: "round_end".into(),
            tick: 100,
            fields,
        };
        assert_eq!(event.get("winner"), Some(&PropValue::UInt(2)));
        assert_eq!(event.get("user_name"), None);
        assert_eq!(event.get("absent"), None);
    }
}
