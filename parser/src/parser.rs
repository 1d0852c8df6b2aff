//! Entry points.

use std::collections::BTreeMap;

use codec::DemoHeader;
use selection::{EventFilter, EventQuery, TickQuery};

use crate::error::ParseResult;
use crate::events::EventCollector;
use crate::grenades::GrenadeCollector;
use crate::limits::ParserLimits;
use crate::output::{EventOutput, GrenadeOutput, TickOutput};
use crate::scan::{scan, Flow, ScanState, Visitor};
use crate::ticks::TickCollector;

/// A demo buffer plus the limits every operation on it runs under.
///
/// Each operation is an independent forward scan of the buffer with its own
/// session state, so a `DemoParser` can be shared freely across threads.
#[derive(Debug, Clone)]
pub struct DemoParser<'a> {
    buf: &'a [u8],
    limits: ParserLimits,
}

impl<'a> DemoParser<'a> {
    /// Parser with default limits.
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_limits(buf, ParserLimits::default())
    }

    #[must_use]
    pub const fn with_limits(buf: &'a [u8], limits: ParserLimits) -> Self {
        Self { buf, limits }
    }

    #[must_use]
    pub const fn limits(&self) -> &ParserLimits {
        &self.limits
    }

    /// Header key/value metadata; empty if the demo has no header frame.
    pub fn parse_header(&self) -> ParseResult<BTreeMap<String, String>> {
        let mut visitor = HeaderVisitor::default();
        scan(self.buf, &self.limits, &mut visitor)?;
        Ok(visitor.header.map(|h| h.entries).unwrap_or_default())
    }

    /// Declared game event names, sorted and de-duplicated.
    pub fn list_game_events(&self) -> ParseResult<Vec<String>> {
        let mut visitor = EventListVisitor;
        let state = scan(self.buf, &self.limits, &mut visitor)?;
        Ok(state.events.names())
    }

    /// Occurrences of one event.
    ///
    /// The event filter of `query` is replaced by `name`.
    pub fn parse_event(&self, name: &str, query: &EventQuery) -> ParseResult<EventOutput> {
        self.collect_events(query, EventFilter::one(name))
    }

    /// Occurrences of every event `query` selects, in arrival order.
    pub fn parse_events(&self, query: &EventQuery) -> ParseResult<EventOutput> {
        self.collect_events(query, query.events.clone())
    }

    fn collect_events(&self, query: &EventQuery, filter: EventFilter) -> ParseResult<EventOutput> {
        let mut collector = EventCollector::new(query, filter);
        let state = scan(self.buf, &self.limits, &mut collector)?;
        Ok(EventOutput {
            events: collector.events,
            warnings: state.into_warnings(),
        })
    }

    /// One row per player controller per selected tick.
    pub fn parse_ticks(&self, query: &TickQuery) -> ParseResult<TickOutput> {
        let mut collector = TickCollector::new(query);
        let state = scan(self.buf, &self.limits, &mut collector)?;
        let (table, columns) = collector.finish(&state);
        Ok(TickOutput {
            table,
            columns,
            warnings: state.into_warnings(),
        })
    }

    /// Position of every grenade projectile at each tick it was alive.
    pub fn parse_grenades(&self) -> ParseResult<GrenadeOutput> {
        let mut collector = GrenadeCollector::default();
        let state = scan(self.buf, &self.limits, &mut collector)?;
        Ok(GrenadeOutput {
            grenades: collector.finish(),
            warnings: state.into_warnings(),
        })
    }
}

#[derive(Default)]
struct HeaderVisitor {
    header: Option<DemoHeader>,
}

impl Visitor for HeaderVisitor {
    fn header(&mut self, header: DemoHeader) -> Flow {
        self.header = Some(header);
        Flow::Stop
    }
}

struct EventListVisitor;

impl Visitor for EventListVisitor {
    fn event_list(&mut self, _state: &ScanState) -> Flow {
        Flow::Stop
    }
}

/// [`DemoParser::parse_header`] with default limits.
pub fn parse_header(buf: &[u8]) -> ParseResult<BTreeMap<String, String>> {
    DemoParser::new(buf).parse_header()
}

/// [`DemoParser::list_game_events`] with default limits.
pub fn list_game_events(buf: &[u8]) -> ParseResult<Vec<String>> {
    DemoParser::new(buf).list_game_events()
}

/// [`DemoParser::parse_event`] with default limits.
pub fn parse_event(buf: &[u8], name: &str, query: &EventQuery) -> ParseResult<EventOutput> {
    DemoParser::new(buf).parse_event(name, query)
}

/// [`DemoParser::parse_events`] with default limits.
pub fn parse_events(buf: &[u8], query: &EventQuery) -> ParseResult<EventOutput> {
    DemoParser::new(buf).parse_events(query)
}

/// [`DemoParser::parse_ticks`] with default limits.
pub fn parse_ticks(buf: &[u8], query: &TickQuery) -> ParseResult<TickOutput> {
    DemoParser::new(buf).parse_ticks(query)
}

/// [`DemoParser::parse_grenades`] with default limits.
pub fn parse_grenades(buf: &[u8]) -> ParseResult<GrenadeOutput> {
    DemoParser::new(buf).parse_grenades()
}
