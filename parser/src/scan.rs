//! The scan driver: one forward pass over the frames of a demo.
//!
//! The driver owns all session state (class and event tables, the entity
//! table, the compiled selection) and reports what it sees to a [`Visitor`].
//! Each operation is a visitor that collects only what it needs and may stop
//! the scan early.

use codec::{
    decode_event, decode_header, peek_event_id, CodecError, DemoHeader, EntityChange,
    EntityTable, InstanceBaseline, PacketEntities, PropValue, Tick,
};
use schema::{
    decode_class_info, decode_send_tables, ClassTable, EventDescriptor, EventDescriptorTable,
};
use selection::{EventFilter, Selection, SelectionRequest};
use wire::{Frame, FrameKind, FrameReader, MessageKind, MessageReader};

use crate::error::ParseResult;
use crate::limits::ParserLimits;
use crate::warning::{ParseWarning, Warnings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Stop,
}

/// Session state visible to visitors.
#[derive(Debug)]
pub(crate) struct ScanState {
    pub classes: ClassTable,
    pub events: EventDescriptorTable,
    pub entities: EntityTable,
    pub selection: Selection,
    /// Tick of the frame being processed.
    pub tick: Tick,
    pub warnings: Warnings,
}

impl ScanState {
    pub(crate) fn new(limits: &ParserLimits) -> Self {
        Self {
            classes: ClassTable::new(),
            events: EventDescriptorTable::new(),
            entities: EntityTable::new(limits.codec.clone()),
            selection: Selection::default(),
            tick: Tick::PREGAME,
            warnings: Warnings::default(),
        }
    }

    pub(crate) fn into_warnings(self) -> Vec<ParseWarning> {
        self.warnings.into_vec()
    }
}

/// Receives what the scan decodes.
pub(crate) trait Visitor {
    /// Properties to decode; `None` skips entity data entirely.
    fn request(&self) -> Option<SelectionRequest> {
        None
    }

    /// Events to decode; `None` skips game events entirely.
    fn event_filter(&self) -> Option<&EventFilter> {
        None
    }

    fn header(&mut self, _header: DemoHeader) -> Flow {
        Flow::Continue
    }

    fn event_list(&mut self, _state: &ScanState) -> Flow {
        Flow::Continue
    }

    fn event(
        &mut self,
        _state: &ScanState,
        _descriptor: &EventDescriptor,
        _values: Vec<PropValue>,
    ) -> Flow {
        Flow::Continue
    }

    fn entity_changes(&mut self, _state: &ScanState, _changes: &[EntityChange]) {}

    /// Called once per tick after its last frame.
    fn tick_end(&mut self, _state: &ScanState, _tick: Tick) -> Flow {
        Flow::Continue
    }
}

/// Runs `visitor` over `buf` and returns the final session state.
pub(crate) fn scan<V: Visitor>(
    buf: &[u8],
    limits: &ParserLimits,
    visitor: &mut V,
) -> ParseResult<ScanState> {
    let mut scanner = Scanner {
        limits,
        request: visitor.request(),
        state: ScanState::new(limits),
        changes: Vec::new(),
        open_tick: None,
    };
    let frames = FrameReader::new(buf, limits.wire.clone())?;
    for frame in frames {
        let frame = frame?;
        if scanner.frame(&frame, visitor)? == Flow::Stop {
            return Ok(scanner.state);
        }
    }
    if let Some(tick) = scanner.open_tick.take() {
        visitor.tick_end(&scanner.state, tick);
    }
    Ok(scanner.state)
}

struct Scanner<'l> {
    limits: &'l ParserLimits,
    request: Option<SelectionRequest>,
    state: ScanState,
    changes: Vec<EntityChange>,
    /// Last in-game tick that has not been completed yet.
    open_tick: Option<Tick>,
}

impl Scanner<'_> {
    fn frame<V: Visitor>(&mut self, frame: &Frame<'_>, visitor: &mut V) -> ParseResult<Flow> {
        let header = &frame.header;
        log::trace!(
            "frame {:?} tick {} size {} at byte {}",
            header.kind,
            header.tick,
            header.size,
            frame.offset
        );
        if header.kind == FrameKind::Stop {
            if let Some(tick) = self.open_tick.take() {
                visitor.tick_end(&self.state, tick);
            }
            return Ok(Flow::Stop);
        }
        if self.advance_tick(Tick::from_frame(header.tick), visitor) == Flow::Stop {
            return Ok(Flow::Stop);
        }

        match header.kind {
            FrameKind::FileHeader => {
                let payload = frame.decompressed(&self.limits.wire)?;
                let header = decode_header(&payload, frame.content_offset()).map_err(|err| {
                    match err {
                        CodecError::UnsupportedFormatVersion { found, .. } => {
                            CodecError::UnsupportedFormatVersion {
                                found,
                                offset: frame.offset,
                            }
                        }
                        other => other,
                    }
                })?;
                return Ok(visitor.header(header));
            }
            FrameKind::SendTables => {
                let payload = frame.decompressed(&self.limits.wire)?;
                let serializers = decode_send_tables(
                    &payload,
                    frame.content_offset(),
                    &self.limits.codec.schema(),
                )?;
                self.state.classes.add_serializers(serializers);
            }
            FrameKind::ClassInfo => {
                let payload = frame.decompressed(&self.limits.wire)?;
                let bindings = decode_class_info(
                    &payload,
                    frame.content_offset(),
                    &self.limits.codec.schema(),
                )?;
                for name in self.state.classes.bind_classes(bindings) {
                    log::warn!("class {name} has no serializer; registered without properties");
                }
                if let Some(request) = &self.request {
                    let state = &mut self.state;
                    state.selection = Selection::compile(&state.classes, request);
                    state.warnings.invalid_filters(state.selection.invalid());
                }
            }
            FrameKind::Packet | FrameKind::SignonPacket | FrameKind::FullPacket => {
                let payload = frame.decompressed(&self.limits.wire)?;
                return self.messages(&payload, frame.content_offset(), visitor);
            }
            FrameKind::Unknown(kind) => {
                self.state.warnings.push(ParseWarning::UnknownFrameKind {
                    kind,
                    offset: frame.offset,
                });
            }
            FrameKind::Stop
            | FrameKind::FileInfo
            | FrameKind::SyncTick
            | FrameKind::StringTables
            | FrameKind::ConsoleCmd
            | FrameKind::UserCmd => {}
        }
        Ok(Flow::Continue)
    }

    /// Moves to the tick of the next frame, completing the open tick when the
    /// new one is later.
    fn advance_tick<V: Visitor>(&mut self, frame_tick: Tick, visitor: &mut V) -> Flow {
        if frame_tick.is_pregame() {
            match self.open_tick {
                Some(open) => {
                    log::debug!("pregame frame after tick {}; folded into it", open.raw());
                }
                None => self.state.tick = Tick::PREGAME,
            }
            return Flow::Continue;
        }
        let tick = match self.open_tick {
            Some(open) if frame_tick < open => {
                log::debug!(
                    "frame tick {} is before tick {}; processing it as {}",
                    frame_tick.raw(),
                    open.raw(),
                    open.raw()
                );
                open
            }
            Some(open) if frame_tick > open => {
                self.open_tick = None;
                if visitor.tick_end(&self.state, open) == Flow::Stop {
                    return Flow::Stop;
                }
                frame_tick
            }
            _ => frame_tick,
        };
        self.open_tick = Some(tick);
        self.state.tick = tick;
        Flow::Continue
    }

    fn messages<V: Visitor>(
        &mut self,
        payload: &[u8],
        base_offset: usize,
        visitor: &mut V,
    ) -> ParseResult<Flow> {
        let wants_entities = self.request.is_some();
        for message in MessageReader::new(payload, base_offset, &self.limits.wire) {
            let message = message?;
            let flow = match message.kind {
                MessageKind::InstanceBaseline if wants_entities => {
                    let baseline = InstanceBaseline::decode(message.body, message.body_offset)?;
                    self.state.entities.set_baseline(&baseline);
                    Flow::Continue
                }
                MessageKind::PacketEntities if wants_entities => {
                    let packet = PacketEntities::decode(message.body, message.body_offset)?;
                    let state = &mut self.state;
                    self.changes.clear();
                    state.entities.apply(
                        &state.classes,
                        &packet,
                        &state.selection,
                        &mut self.changes,
                    )?;
                    if !self.changes.is_empty() {
                        visitor.entity_changes(&self.state, &self.changes);
                    }
                    Flow::Continue
                }
                MessageKind::GameEventList => {
                    let list = EventDescriptorTable::decode(
                        message.body,
                        message.body_offset,
                        &self.limits.codec.schema(),
                    )?;
                    let state = &mut self.state;
                    state.events.merge(list);
                    if let Some(filter) = visitor.event_filter() {
                        let missing = filter.missing(|name| state.events.contains_name(name));
                        state.warnings.invalid_filters(&missing);
                    }
                    visitor.event_list(&self.state)
                }
                MessageKind::GameEvent => {
                    self.game_event(message.body, message.body_offset, visitor)?
                }
                MessageKind::NetTick
                | MessageKind::InstanceBaseline
                | MessageKind::PacketEntities => Flow::Continue,
                MessageKind::Unknown(kind) => {
                    log::debug!(
                        "skipping unknown message kind {kind} at byte {}",
                        message.offset
                    );
                    Flow::Continue
                }
            };
            if flow == Flow::Stop {
                return Ok(Flow::Stop);
            }
        }
        Ok(Flow::Continue)
    }

    fn game_event<V: Visitor>(
        &mut self,
        body: &[u8],
        body_offset: usize,
        visitor: &mut V,
    ) -> ParseResult<Flow> {
        if visitor.event_filter().is_none() {
            return Ok(Flow::Continue);
        }
        let event_id = peek_event_id(body, body_offset)?;
        let descriptor = match self.state.events.get(event_id) {
            Some(descriptor) if descriptor.is_decodable() => descriptor,
            _ => {
                let tick = self.state.tick.raw();
                self.state
                    .warnings
                    .push(ParseWarning::UnknownEventDescriptor { event_id, tick });
                return Ok(Flow::Continue);
            }
        };
        let wanted = visitor
            .event_filter()
            .is_some_and(|filter| filter.wants(&descriptor.name));
        if !wanted {
            return Ok(Flow::Continue);
        }
        let values = decode_event(
            descriptor,
            body,
            body_offset,
            self.limits.codec.max_string_bytes,
        )?;
        Ok(visitor.event(&self.state, descriptor, values))
    }
}
