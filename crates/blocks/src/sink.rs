//! Output side effects of the music blocks.
//!
//! Blocks never touch an audio device directly. They describe what should
//! happen as [`Event`]s and hand them to an [`EventSink`]. A real host
//! would synthesize sound from them; [`RecordingSink`] keeps them in memory.

use std::cell::{Cell, RefCell};
use std::fmt;

use serde::Serialize;

use crate::error::SinkError;

/// One observable effect, stamped with the virtual time it happened at.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    Note {
        pitch: String,
        duration_ms: f64,
        at_ms: f64,
    },
    Volume {
        level: f64,
        /// Gain in decibels, -100 for silence.
        db: f64,
        at_ms: f64,
    },
    Print {
        message: String,
        at_ms: f64,
    },
}

impl Event {
    pub fn at_ms(&self) -> f64 {
        match self {
            Event::Note { at_ms, .. } | Event::Volume { at_ms, .. } | Event::Print { at_ms, .. } => *at_ms,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Note { pitch, duration_ms, .. } => write!(f, "note {pitch} {duration_ms}ms"),
            Event::Volume { level, db, .. } => write!(f, "volume {level} ({db:.1} dB)"),
            Event::Print { message, .. } => write!(f, "print {message}"),
        }
    }
}

/// Receives events from running blocks.
///
/// `open` and `close` bracket one program run.
pub trait EventSink {
    fn open(&self) -> Result<(), SinkError>;
    fn close(&self) -> Result<(), SinkError>;
    fn emit(&self, event: Event);
}

/// Sink that stores every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: RefCell<Vec<Event>>,
    open: Cell<bool>,
    unavailable: Option<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose `open` always fails with `reason`.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            unavailable: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&self) -> Vec<Event> {
        self.events.borrow_mut().drain(..).collect()
    }

    pub fn is_open(&self) -> bool {
        self.open.get()
    }
}

impl EventSink for RecordingSink {
    fn open(&self) -> Result<(), SinkError> {
        if let Some(reason) = &self.unavailable {
            return Err(SinkError::Unavailable(reason.clone()));
        }
        if self.open.replace(true) {
            return Err(SinkError::AlreadyOpen);
        }
        Ok(())
    }

    fn close(&self) -> Result<(), SinkError> {
        self.open.set(false);
        Ok(())
    }

    fn emit(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}
