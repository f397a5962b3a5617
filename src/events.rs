//! Synchronous publish/subscribe keyed by gesture kind.

use serde::Serialize;
use std::{collections::HashMap, fmt};

use crate::error::{EngineError, ListenerError, UnknownGesture};
use crate::gestures::{GestureData, GestureKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventPhase {
    Start,
    Current,
    End,
    /// Start, current and end in one event (tap, swipe, bursts).
    Instant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GestureEvent {
    pub kind: GestureKind,
    pub phase: EventPhase,
    pub time_ms: f64,
    /// Time since the first controller of the session connected.
    pub session_ms: f64,
    pub data: GestureData,
}

impl GestureEvent {
    pub fn new(
        kind: GestureKind,
        phase: EventPhase,
        time_ms: f64,
        session_ms: f64,
        data: GestureData,
    ) -> Self {
        Self {
            kind,
            phase,
            time_ms,
            session_ms,
            data,
        }
    }

    pub fn is_start(&self) -> bool {
        matches!(self.phase, EventPhase::Start | EventPhase::Instant)
    }

    pub fn is_current(&self) -> bool {
        !matches!(self.phase, EventPhase::End)
    }

    pub fn is_end(&self) -> bool {
        matches!(self.phase, EventPhase::End | EventPhase::Instant)
    }
}

pub type Listener = Box<dyn FnMut(&GestureEvent) -> Result<(), ListenerError>>;

#[derive(Default)]
pub struct EventBus {
    listeners: HashMap<GestureKind, Vec<Listener>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts: Vec<_> = self
            .listeners
            .iter()
            .map(|(k, v)| (k.as_str(), v.len()))
            .collect();
        counts.sort();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registering the same kind repeatedly keeps every listener.
    pub fn on<F>(&mut self, kind: GestureKind, listener: F)
    where
        F: FnMut(&GestureEvent) -> Result<(), ListenerError> + 'static,
    {
        self.listeners
            .entry(kind)
            .or_default()
            .push(Box::new(listener));
    }

    /// `on` keyed by the event name ("tap", "dualswipe", ...).
    pub fn on_named<F>(&mut self, name: &str, listener: F) -> Result<(), UnknownGesture>
    where
        F: FnMut(&GestureEvent) -> Result<(), ListenerError> + 'static,
    {
        let kind = name.parse::<GestureKind>()?;
        self.on(kind, listener);
        Ok(())
    }

    pub fn listener_count(&self, kind: GestureKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }

    /// Call listeners for `event.kind` in registration order. The first
    /// failure stops the fan-out and is returned.
    pub fn emit(&mut self, event: &GestureEvent) -> Result<(), EngineError> {
        if let Some(listeners) = self.listeners.get_mut(&event.kind) {
            for listener in listeners.iter_mut() {
                listener(event).map_err(|source| EngineError::Listener {
                    kind: event.kind,
                    source,
                })?;
            }
        }
        Ok(())
    }
}
