//! Player lookups over the live entity table.

use codec::{Entity, EntityHandle, EntityIndex, EntityTable, PropValue};
use selection::{Column, ColumnSource, PlayerIdentity};

/// The pawn a controller currently points at.
pub(crate) fn pawn_of<'a>(
    entities: &'a EntityTable,
    identity: &PlayerIdentity,
    controller: &Entity,
) -> Option<&'a Entity> {
    let handle = controller.value(identity.pawn_handle?)?.as_handle()?;
    entities
        .by_handle(EntityHandle::from_raw(handle))
        .filter(|pawn| Some(pawn.class_id) == identity.pawn_class)
}

/// The controller whose pawn handle points at `pawn`.
pub(crate) fn controller_of_pawn<'a>(
    entities: &'a EntityTable,
    identity: &PlayerIdentity,
    pawn: &Entity,
) -> Option<&'a Entity> {
    controllers(entities, identity).find(|controller| {
        pawn_of(entities, identity, controller).is_some_and(|p| p.index == pawn.index)
    })
}

/// Controller by entity index.
pub(crate) fn controller_at<'a>(
    entities: &'a EntityTable,
    identity: &PlayerIdentity,
    index: EntityIndex,
) -> Option<&'a Entity> {
    entities
        .get(index)
        .filter(|e| Some(e.class_id) == identity.controller_class)
}

/// Active controllers in ascending index order.
pub(crate) fn controllers<'a>(
    entities: &'a EntityTable,
    identity: &PlayerIdentity,
) -> impl Iterator<Item = &'a Entity> + 'a {
    let class_id = identity.controller_class;
    entities
        .iter()
        .filter(move |e| Some(e.class_id) == class_id)
}

pub(crate) fn game_rules<'a>(
    entities: &'a EntityTable,
    identity: &PlayerIdentity,
) -> Option<&'a Entity> {
    let class_id = identity.game_rules_class?;
    entities.iter().find(|e| e.class_id == class_id)
}

pub(crate) fn player_name(identity: &PlayerIdentity, controller: &Entity) -> Option<String> {
    controller
        .value(identity.name?)?
        .as_str()
        .map(str::to_string)
}

pub(crate) fn steam_id(identity: &PlayerIdentity, controller: &Entity) -> Option<u64> {
    controller.value(identity.steam_id?)?.as_u64()
}

/// Value of a player column for one controller.
pub(crate) fn player_value(
    entities: &EntityTable,
    identity: &PlayerIdentity,
    controller: &Entity,
    column: &Column,
) -> Option<PropValue> {
    let raw = match column.source {
        ColumnSource::Controller(index) => controller.value(index)?,
        ColumnSource::Pawn(index) => pawn_of(entities, identity, controller)?.value(index)?,
        ColumnSource::GameRules(_) => return None,
    };
    column.project(raw)
}

/// Value of a game-rules column.
pub(crate) fn other_value(
    entities: &EntityTable,
    identity: &PlayerIdentity,
    column: &Column,
) -> Option<PropValue> {
    let ColumnSource::GameRules(index) = column.source else {
        return None;
    };
    column.project(game_rules(entities, identity)?.value(index)?)
}
