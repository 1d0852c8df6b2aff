//! Compiled selection: per-class masks and resolved output columns.
//!
//! A [`Selection`] is a pure function of the class table and the requested
//! names. The parser recompiles it whenever class bindings change and hands it
//! to the entity table as the [`PropInterest`] that decides what to decode.

use std::collections::{BTreeMap, HashMap};

use codec::{PropInterest, PropValue};
use schema::{ClassId, ClassTable, EntityClass};

use crate::alias::{
    resolve_alias, ClassRole, ORIGIN_PROP, PLAYER_NAME_PROP, PLAYER_PAWN_PROP, STEAM_ID_PROP,
    TEAM_PROP, THROWER_PROP,
};

/// Where a column's value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSource {
    /// Player controller property.
    Controller(usize),
    /// Property of the pawn reached through the controller's pawn handle.
    Pawn(usize),
    /// Game rules singleton property.
    GameRules(usize),
}

/// One resolved output column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// The name the caller asked for.
    pub name: String,
    pub source: ColumnSource,
    pub component: Option<usize>,
}

impl Column {
    /// Applies the column's vector component, if any, to a raw value.
    #[must_use]
    pub fn project(&self, value: &PropValue) -> Option<PropValue> {
        match self.component {
            None => Some(value.clone()),
            Some(i) => value
                .as_vector()
                .and_then(|v| v.get(i).copied())
                .map(PropValue::Float),
        }
    }
}

/// Identity property indices of the player classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerIdentity {
    pub controller_class: Option<ClassId>,
    pub pawn_class: Option<ClassId>,
    pub game_rules_class: Option<ClassId>,
    pub name: Option<usize>,
    pub steam_id: Option<usize>,
    pub pawn_handle: Option<usize>,
    pub team: Option<usize>,
    pub pawn_origin: Option<usize>,
}

/// Position and thrower indices of one grenade class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrenadeProps {
    pub origin: Option<usize>,
    pub thrower: Option<usize>,
}

/// Names to resolve against a class table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionRequest {
    /// Resolved on the controller class, then on the pawn class.
    pub player_props: Vec<String>,
    /// Resolved on the game rules class.
    pub other_props: Vec<String>,
    /// Decode grenade positions and throwers.
    pub grenades: bool,
}

/// Compiled form of a [`SelectionRequest`].
#[derive(Debug, Clone, Default)]
pub struct Selection {
    masks: HashMap<ClassId, Vec<bool>>,
    roles: HashMap<ClassId, ClassRole>,
    player_columns: Vec<Column>,
    other_columns: Vec<Column>,
    invalid: Vec<String>,
    identity: PlayerIdentity,
    grenades: BTreeMap<ClassId, GrenadeProps>,
}

impl Selection {
    /// Resolves every requested name against `classes`.
    ///
    /// Names that resolve nowhere are listed by [`Selection::invalid`] and
    /// produce no column. Repeated names produce one column.
    #[must_use]
    pub fn compile(classes: &ClassTable, request: &SelectionRequest) -> Self {
        let mut selection = Self::default();
        let mut controller = None;
        let mut pawn = None;
        let mut game_rules = None;

        for class in classes.iter() {
            let role = ClassRole::of(class);
            selection.roles.insert(class.id, role);
            match role {
                ClassRole::Controller => controller = Some(class),
                ClassRole::Pawn => pawn = Some(class),
                ClassRole::GameRules => game_rules = Some(class),
                ClassRole::Grenade if request.grenades => {
                    let props = GrenadeProps {
                        origin: class.find_prop(ORIGIN_PROP),
                        thrower: class.find_prop(THROWER_PROP),
                    };
                    selection.want(class, props.origin);
                    selection.want(class, props.thrower);
                    selection.grenades.insert(class.id, props);
                }
                ClassRole::Grenade | ClassRole::Other => {}
            }
        }

        if let Some(class) = controller {
            let identity = &mut selection.identity;
            identity.controller_class = Some(class.id);
            identity.name = class.find_prop(PLAYER_NAME_PROP);
            identity.steam_id = class.find_prop(STEAM_ID_PROP);
            identity.pawn_handle = class.find_prop(PLAYER_PAWN_PROP);
            identity.team = class.find_prop(TEAM_PROP);
            let wanted = [
                identity.name,
                identity.steam_id,
                identity.pawn_handle,
                identity.team,
            ];
            for index in wanted {
                selection.want(class, index);
            }
        }
        if let Some(class) = pawn {
            selection.identity.pawn_class = Some(class.id);
            selection.identity.pawn_origin = class.find_prop(ORIGIN_PROP);
            if request.grenades {
                selection.want(class, selection.identity.pawn_origin);
            }
        }
        selection.identity.game_rules_class = game_rules.map(|class| class.id);

        for name in dedup(&request.player_props) {
            let path = resolve_alias(name);
            let source = controller
                .and_then(|class| class.find_prop(&path.prop).map(|i| (class, i)))
                .map(|(class, i)| (class, ColumnSource::Controller(i)))
                .or_else(|| {
                    pawn.and_then(|class| class.find_prop(&path.prop).map(|i| (class, i)))
                        .map(|(class, i)| (class, ColumnSource::Pawn(i)))
                });
            match source {
                Some((class, source)) => {
                    selection.want(class, Some(source_index(source)));
                    selection.player_columns.push(Column {
                        name: name.to_string(),
                        source,
                        component: path.component,
                    });
                }
                None => selection.invalid.push(name.to_string()),
            }
        }

        for name in dedup(&request.other_props) {
            let path = resolve_alias(name);
            match game_rules.and_then(|class| class.find_prop(&path.prop).map(|i| (class, i))) {
                Some((class, index)) => {
                    selection.want(class, Some(index));
                    selection.other_columns.push(Column {
                        name: name.to_string(),
                        source: ColumnSource::GameRules(index),
                        component: path.component,
                    });
                }
                None => selection.invalid.push(name.to_string()),
            }
        }

        selection
    }

    fn want(&mut self, class: &EntityClass, index: Option<usize>) {
        let Some(index) = index else {
            return;
        };
        let mask = self
            .masks
            .entry(class.id)
            .or_insert_with(|| vec![false; class.prop_count()]);
        if let Some(slot) = mask.get_mut(index) {
            *slot = true;
        }
    }

    #[must_use]
    pub fn role(&self, class_id: ClassId) -> ClassRole {
        self.roles.get(&class_id).copied().unwrap_or(ClassRole::Other)
    }

    #[must_use]
    pub fn player_columns(&self) -> &[Column] {
        &self.player_columns
    }

    #[must_use]
    pub fn other_columns(&self) -> &[Column] {
        &self.other_columns
    }

    /// Requested names that matched no property.
    #[must_use]
    pub fn invalid(&self) -> &[String] {
        &self.invalid
    }

    #[must_use]
    pub const fn identity(&self) -> &PlayerIdentity {
        &self.identity
    }

    #[must_use]
    pub fn grenade_props(&self, class_id: ClassId) -> Option<&GrenadeProps> {
        self.grenades.get(&class_id)
    }

    /// Number of properties marked for decoding across all classes.
    #[must_use]
    pub fn wanted_count(&self) -> usize {
        self.masks
            .values()
            .map(|mask| mask.iter().filter(|w| **w).count())
            .sum()
    }
}

impl PropInterest for Selection {
    fn wants(&self, class_id: ClassId, prop_index: usize) -> bool {
        self.masks
            .get(&class_id)
            .and_then(|mask| mask.get(prop_index))
            .copied()
            .unwrap_or(false)
    }
}

const fn source_index(source: ColumnSource) -> usize {
    match source {
        ColumnSource::Controller(i) | ColumnSource::Pawn(i) | ColumnSource::GameRules(i) => i,
    }
}

fn dedup(names: &[String]) -> impl Iterator<Item = &str> {
    let mut seen = std::collections::HashSet::new();
    names
        .iter()
        .map(String::as_str)
        .filter(move |name| seen.insert(*name))
}
