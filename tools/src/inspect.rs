use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;
use wire::{FrameKind, FrameReader, Limits, MessageKind, MessageReader, WireResult};

/// Byte and count totals for one frame kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    pub count: usize,
    pub compressed: usize,
    /// Payload bytes as stored in the file.
    pub stored_bytes: u64,
    /// Payload bytes after decompression.
    pub payload_bytes: u64,
}

/// Structural summary of one demo file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InspectReport {
    pub file_bytes: u64,
    pub frames: BTreeMap<String, FrameStats>,
    /// Message counts across every packet frame.
    pub messages: BTreeMap<String, usize>,
    pub first_tick: Option<u32>,
    pub last_tick: Option<u32>,
    pub stopped: bool,
}

impl InspectReport {
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.values().map(|stats| stats.count).sum()
    }
}

/// Walks every frame and message of `bytes` without decoding their contents.
pub fn inspect_demo(bytes: &[u8], limits: &Limits) -> WireResult<InspectReport> {
    let mut report = InspectReport {
        file_bytes: bytes.len() as u64,
        ..InspectReport::default()
    };
    for frame in FrameReader::new(bytes, limits.clone())? {
        let frame = frame?;
        let header = frame.header;
        let payload = frame.decompressed(limits)?;

        let stats = report.frames.entry(frame_label(header.kind)).or_default();
        stats.count += 1;
        stats.compressed += usize::from(header.compressed);
        stats.stored_bytes += frame.payload.len() as u64;
        stats.payload_bytes += payload.len() as u64;

        if header.kind == FrameKind::Stop {
            report.stopped = true;
            break;
        }
        if !header.is_pregame() {
            report.first_tick.get_or_insert(header.tick);
            report.last_tick = Some(report.last_tick.map_or(header.tick, |t| t.max(header.tick)));
        }
        if header.kind.carries_messages() {
            for message in MessageReader::new(&payload, frame.content_offset(), limits) {
                let message = message?;
                *report.messages.entry(message_label(message.kind)).or_default() += 1;
            }
        }
    }
    Ok(report)
}

fn frame_label(kind: FrameKind) -> String {
    match kind {
        FrameKind::Unknown(raw) => format!("Unknown({raw})"),
        known => format!("{known:?}"),
    }
}

fn message_label(kind: MessageKind) -> String {
    match kind {
        MessageKind::Unknown(raw) => format!("Unknown({raw})"),
        known => format!("{known:?}"),
    }
}

/// Renders a report as an indented text block.
#[must_use]
pub fn format_report_pretty(report: &InspectReport) -> String {
    let mut out = String::new();
    let ticks = match (report.first_tick, report.last_tick) {
        (Some(first), Some(last)) => format!("ticks {first}..={last}"),
        _ => "no in-game ticks".to_string(),
    };
    let _ = writeln!(
        out,
        "{} bytes, {} frames, {ticks}{}",
        report.file_bytes,
        report.frame_count(),
        if report.stopped { "" } else { " (no stop frame)" }
    );
    let _ = writeln!(out, "frames:");
    for (kind, stats) in &report.frames {
        let _ = writeln!(
            out,
            "  {kind}: {} ({} compressed), {} stored / {} payload bytes",
            stats.count, stats.compressed, stats.stored_bytes, stats.payload_bytes
        );
    }
    if !report.messages.is_empty() {
        let _ = writeln!(out, "messages:");
        for (kind, count) in &report.messages {
            let _ = writeln!(out, "  {kind}: {count}");
        }
    }
    out
}
