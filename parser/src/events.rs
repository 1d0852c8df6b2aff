//! Game event collection with player enrichment.

use codec::{Entity, EntityHandle, EntityIndex, EntityTable, PropValue};
use indexmap::IndexMap;
use schema::{EventDescriptor, EventKeyType};
use selection::{EventFilter, EventQuery, PlayerIdentity, SelectionRequest};

use crate::output::GameEvent;
use crate::players::{
    controller_at, controller_of_pawn, other_value, player_name, player_value, steam_id,
};
use crate::scan::{Flow, ScanState, Visitor};

pub(crate) struct EventCollector<'q> {
    query: &'q EventQuery,
    filter: EventFilter,
    pub events: Vec<GameEvent>,
}

impl<'q> EventCollector<'q> {
    /// Collects the events `filter` admits, enriched as `query` asks.
    pub(crate) fn new(query: &'q EventQuery, filter: EventFilter) -> Self {
        Self {
            query,
            filter,
            events: Vec::new(),
        }
    }
}

impl Visitor for EventCollector<'_> {
    fn request(&self) -> Option<SelectionRequest> {
        Some(SelectionRequest {
            player_props: self.query.player_props.clone(),
            other_props: self.query.other_props.clone(),
            grenades: false,
        })
    }

    fn event_filter(&self) -> Option<&EventFilter> {
        Some(&self.filter)
    }

    fn event(
        &mut self,
        state: &ScanState,
        descriptor: &EventDescriptor,
        values: Vec<PropValue>,
    ) -> Flow {
        let identity = state.selection.identity();
        let mut fields = IndexMap::with_capacity(values.len());
        let mut players = Vec::new();
        for (key, value) in descriptor.keys.iter().zip(values) {
            if key.ty.is_player() {
                let controller = resolve_player(&state.entities, identity, key.ty, &value);
                players.push((player_prefix(&key.name), controller));
            }
            fields.insert(key.name.clone(), Some(value));
        }

        for (prefix, controller) in players {
            fields.insert(
                format!("{prefix}_name"),
                controller
                    .and_then(|c| player_name(identity, c))
                    .map(PropValue::String),
            );
            fields.insert(
                format!("{prefix}_steamid"),
                controller
                    .and_then(|c| steam_id(identity, c))
                    .map(PropValue::UInt),
            );
            for column in state.selection.player_columns() {
                let value = controller
                    .and_then(|c| player_value(&state.entities, identity, c, column));
                fields.insert(format!("{prefix}_{}", column.name), value);
            }
        }
        for column in state.selection.other_columns() {
            fields.insert(
                column.name.clone(),
                other_value(&state.entities, identity, column),
            );
        }

        self.events.push(GameEvent {
            name: descriptor.name.clone(),
            tick: state.tick.raw(),
            fields,
        });
        Flow::Continue
    }
}

/// The controller a player-typed event key refers to.
fn resolve_player<'a>(
    entities: &'a EntityTable,
    identity: &PlayerIdentity,
    ty: EventKeyType,
    value: &PropValue,
) -> Option<&'a Entity> {
    match ty {
        EventKeyType::PlayerController => {
            let index = u32::try_from(value.as_u64()?).ok()?;
            controller_at(entities, identity, EntityIndex::new(index))
        }
        EventKeyType::PlayerPawn => {
            let pawn = entities.by_handle(EntityHandle::from_raw(value.as_handle()?))?;
            controller_of_pawn(entities, identity, pawn)
        }
        _ => None,
    }
}

/// Field prefix for a player key: `userid` becomes `user`.
fn player_prefix(key: &str) -> &str {
    match key.strip_suffix("id") {
        Some(prefix) if !prefix.is_empty() => prefix,
        _ => key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_drops_trailing_id() {
        assert_eq!(player_prefix("userid"), "user");
        assert_eq!(player_prefix("attacker"), "attacker");
        assert_eq!(player_prefix("id"), "id");
        assert_eq!(player_prefix("assisterid"), "assister");
    }

    #[test]
    fn non_player_keys_resolve_to_nobody() {
        let entities = EntityTable::default();
        let identity = PlayerIdentity::default();
        assert!(resolve_player(
            &entities,
            &identity,
            EventKeyType::Long,
            &PropValue::SInt(3)
        )
        .is_none());
        assert!(resolve_player(
            &entities,
            &identity,
            EventKeyType::PlayerController,
            &PropValue::UInt(3)
        )
        .is_none());
    }
}
