//! Two-handed controller gesture recognition for XR sessions.
//!
//! A [`GestureEngine`] samples controller poses through a [`PoseProvider`]
//! once per host frame, runs the detector bank and publishes
//! [`GestureEvent`]s to registered listeners.

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod gestures;
pub mod lifecycle;
pub mod pair;
pub mod provider;
pub mod ring;
pub mod timers;
pub mod trace;
pub mod tracker;

pub use config::Profile;
pub use engine::GestureEngine;
pub use error::{ConfigError, EngineError, ListenerError, TraceError, UnknownGesture};
pub use events::{EventBus, EventPhase, GestureEvent};
pub use gestures::{Direction, GestureData, GestureKind, GestureState, Phase};
pub use provider::{ControllerPose, PoseProvider};
pub use trace::{TraceFrame, TraceProvider, parse_trace, replay};
