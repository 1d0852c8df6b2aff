//! Grenade projectile trajectories.

use std::collections::BTreeMap;

use codec::{Entity, EntityChange, EntityHandle, EntityIndex, Generation, Tick};
use selection::{ClassRole, SelectionRequest};

use crate::output::{GrenadePoint, GrenadeTrajectory};
use crate::players::{controller_of_pawn, player_name, steam_id};
use crate::scan::{Flow, ScanState, Visitor};

/// Tracks every projectile lifetime; a reused slot starts a new trajectory.
#[derive(Debug, Default)]
pub(crate) struct GrenadeCollector {
    /// Live projectiles: slot -> (lifetime, position in `grenades`).
    active: BTreeMap<EntityIndex, (Generation, usize)>,
    grenades: Vec<GrenadeTrajectory>,
}

impl GrenadeCollector {
    /// Trajectories ordered by creation tick, then entity index.
    pub(crate) fn finish(mut self) -> Vec<GrenadeTrajectory> {
        self.grenades
            .sort_by_key(|g| (g.created_tick, g.entity_id));
        self.grenades
    }

    fn created(&mut self, state: &ScanState, index: EntityIndex, generation: Generation) {
        let Some(entity) = state.entities.get(index) else {
            return;
        };
        let grenade_type = state
            .classes
            .get(entity.class_id)
            .map_or_else(String::new, |class| class.name.clone());
        let (thrower_name, thrower_steamid) = thrower(state, entity);
        log::trace!("projectile {grenade_type} created at slot {}", index.raw());
        self.active.insert(index, (generation, self.grenades.len()));
        self.grenades.push(GrenadeTrajectory {
            entity_id: index.raw(),
            grenade_type,
            created_tick: state.tick.raw(),
            thrower_name,
            thrower_steamid,
            points: Vec::new(),
        });
    }
}

/// Name and steam id of the player whose pawn threw `grenade`.
fn thrower(state: &ScanState, grenade: &Entity) -> (Option<String>, Option<u64>) {
    let identity = state.selection.identity();
    let controller = state
        .selection
        .grenade_props(grenade.class_id)
        .and_then(|props| grenade.value(props.thrower?))
        .and_then(codec::PropValue::as_handle)
        .and_then(|raw| state.entities.by_handle(EntityHandle::from_raw(raw)))
        .and_then(|pawn| controller_of_pawn(&state.entities, identity, pawn));
    match controller {
        Some(controller) => (
            player_name(identity, controller),
            steam_id(identity, controller),
        ),
        None => (None, None),
    }
}

impl Visitor for GrenadeCollector {
    fn request(&self) -> Option<SelectionRequest> {
        Some(SelectionRequest {
            grenades: true,
            ..SelectionRequest::default()
        })
    }

    fn entity_changes(&mut self, state: &ScanState, changes: &[EntityChange]) {
        for change in changes {
            match *change {
                EntityChange::Created {
                    index,
                    generation,
                    class_id,
                } => {
                    // Whatever lived in the slot before is over.
                    self.active.remove(&index);
                    if state.selection.role(class_id) == ClassRole::Grenade {
                        self.created(state, index, generation);
                    }
                }
                EntityChange::Deleted {
                    index, generation, ..
                } => {
                    if self.active.get(&index).is_some_and(|(g, _)| *g == generation) {
                        self.active.remove(&index);
                    }
                }
            }
        }
    }

    fn tick_end(&mut self, state: &ScanState, tick: Tick) -> Flow {
        if tick.is_pregame() {
            return Flow::Continue;
        }
        for (index, (generation, slot)) in &self.active {
            let origin = state
                .entities
                .get(*index)
                .filter(|entity| entity.generation == *generation)
                .and_then(|entity| {
                    let props = state.selection.grenade_props(entity.class_id)?;
                    entity.value(props.origin?)?.as_vector()
                });
            if let (Some([x, y, z]), Some(grenade)) = (origin, self.grenades.get_mut(*slot)) {
                grenade.points.push(GrenadePoint {
                    tick: tick.raw(),
                    x,
                    y,
                    z,
                });
            }
        }
        Flow::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::ParserLimits;

    #[test]
    fn slot_reused_by_other_class_ends_trajectory() {
        let state = ScanState::new(&ParserLimits::for_testing());
        let slot = EntityIndex::new(200);
        let mut collector = GrenadeCollector::default();
        collector.active.insert(slot, (Generation::new(1), 0));
        collector.grenades.push(GrenadeTrajectory {
            entity_id: 200,
            grenade_type: "CSmokeGrenadeProjectile".to_string(),
            created_tick: 1,
            thrower_name: None,
            thrower_steamid: None,
            points: Vec::new(),
        });

        collector.entity_changes(
            &state,
            &[EntityChange::Created {
                index: slot,
                generation: Generation::new(2),
                class_id: 3,
            }],
        );
        assert!(collector.active.is_empty());
        assert_eq!(collector.finish().len(), 1);
    }
}
