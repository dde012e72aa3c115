//! Engine event reporting.
//!
//! The engine reports what happens through an injected [`EventSink`]. Sinks
//! must never interrupt play, so any I/O failure inside a sink is swallowed.

use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// What an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MapLoaded,
    MapSaved,
    GameLoaded,
    GameSaved,
    PhaseChanged,
    OrderIssued,
    OrderExecuted,
    OrderExpired,
    TurnCompleted,
    PlayerEliminated,
    GameOver,
}

impl EventKind {
    pub const fn tag(self) -> &'static str {
        match self {
            EventKind::MapLoaded => "map",
            EventKind::MapSaved => "map",
            EventKind::GameLoaded => "game",
            EventKind::GameSaved => "game",
            EventKind::PhaseChanged => "phase",
            EventKind::OrderIssued => "issue",
            EventKind::OrderExecuted => "execute",
            EventKind::OrderExpired => "expire",
            EventKind::TurnCompleted => "turn",
            EventKind::PlayerEliminated => "eliminated",
            EventKind::GameOver => "gameover",
        }
    }
}

/// One reported event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameEvent {
    pub kind: EventKind,
    pub message: String,
}

impl GameEvent {
    pub fn new(kind: EventKind, message: impl Into<String>) -> Self {
        GameEvent {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.tag(), self.message)
    }
}

/// Receives engine events.
pub trait EventSink: Send {
    fn emit(&mut self, event: &GameEvent);
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&mut self, event: &GameEvent) {
        match event.kind {
            EventKind::OrderIssued | EventKind::OrderExecuted | EventKind::OrderExpired => {
                log::debug!("{event}")
            }
            _ => log::info!("{event}"),
        }
    }
}

/// Writes one `[tag] message` line per event.
pub struct WriterSink<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(out: W) -> Self {
        WriterSink { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> EventSink for WriterSink<W> {
    fn emit(&mut self, event: &GameEvent) {
        let _ = writeln!(self.out, "{event}");
        let _ = self.out.flush();
    }
}

/// Records events in a shared buffer. Clones share the buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<GameEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies out every event recorded so far.
    pub fn events(&self) -> Vec<GameEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Number of recorded events of `kind`.
    pub fn count(&self, kind: EventKind) -> usize {
        self.events
            .lock()
            .map(|e| e.iter().filter(|ev| ev.kind == kind).count())
            .unwrap_or(0)
    }
}

impl EventSink for MemorySink {
    fn emit(&mut self, event: &GameEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Drops every event.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &GameEvent) {}
}
