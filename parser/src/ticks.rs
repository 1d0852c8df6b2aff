//! Per-tick player rows.

use codec::Tick;
use selection::{SelectionRequest, TickQuery};

use crate::output::{RowIdentity, TickTable};
use crate::players::{controllers, player_name, player_value, steam_id};
use crate::scan::{Flow, ScanState, Visitor};

pub(crate) struct TickCollector<'q> {
    query: &'q TickQuery,
    table: Option<TickTable>,
    names: Vec<String>,
}

impl<'q> TickCollector<'q> {
    pub(crate) const fn new(query: &'q TickQuery) -> Self {
        Self {
            query,
            table: None,
            names: Vec::new(),
        }
    }

    /// The collected table and its column names as of the end of the scan.
    pub(crate) fn finish(self, state: &ScanState) -> (TickTable, Vec<String>) {
        let names = if self.table.is_some() {
            self.names
        } else {
            column_names(state)
        };
        let table = self
            .table
            .unwrap_or_else(|| TickTable::new(self.query.struct_of_arrays, &names));
        (table, names)
    }
}

fn column_names(state: &ScanState) -> Vec<String> {
    state
        .selection
        .player_columns()
        .iter()
        .map(|column| column.name.clone())
        .collect()
}

impl Visitor for TickCollector<'_> {
    fn request(&self) -> Option<SelectionRequest> {
        Some(SelectionRequest {
            player_props: self.query.props.clone(),
            other_props: Vec::new(),
            grenades: false,
        })
    }

    fn tick_end(&mut self, state: &ScanState, tick: Tick) -> Flow {
        let raw = tick.raw();
        if tick.is_pregame() || !self.query.ticks.contains(raw) {
            return Flow::Continue;
        }
        if self.table.is_none() {
            self.names = column_names(state);
            self.table = Some(TickTable::new(self.query.struct_of_arrays, &self.names));
        }
        let Some(table) = self.table.as_mut() else {
            return Flow::Continue;
        };

        let identity = state.selection.identity();
        let columns = state.selection.player_columns();
        for controller in controllers(&state.entities, identity) {
            let steamid = steam_id(identity, controller);
            if !self.query.players.contains(steamid) {
                continue;
            }
            let row = RowIdentity {
                tick: raw,
                entity_id: controller.index.raw(),
                steamid,
                name: player_name(identity, controller),
            };
            // Columns are frozen at the first row; a later class rebind may reorder them.
            let values = self.names.iter().map(|name| {
                columns
                    .iter()
                    .find(|column| column.name == *name)
                    .and_then(|column| player_value(&state.entities, identity, controller, column))
            });
            table.push(&self.names, row, values);
        }

        if self.query.ticks.exhausted_after(raw) {
            log::debug!("tick filter exhausted at tick {raw}");
            return Flow::Stop;
        }
        Flow::Continue
    }
}
