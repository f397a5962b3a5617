use std::{error::Error, io, path::PathBuf};
use thiserror::Error;

use crate::gestures::GestureKind;

/// Boxed error a listener may hand back to the engine.
pub type ListenerError = Box<dyn Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("pose provider reports an unusable screen size {width}x{height} mm")]
    InvalidProvider { width: f32, height: f32 },

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("unknown controller index {0}")]
    UnknownController(usize),

    #[error("listener for '{kind}' failed: {source}")]
    Listener {
        kind: GestureKind,
        #[source]
        source: ListenerError,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("trace line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
#[error("unknown gesture '{0}'")]
pub struct UnknownGesture(pub String);
