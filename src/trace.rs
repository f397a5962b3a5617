//! Recorded pose traces, one JSON object per line:
//!
//! ```text
//! {"t_ms":0,"connect":[0],"poses":[{"projected":[0.0,0.0]},null]}
//! {"t_ms":10,"poses":[{"world":[0.1,1.2,-0.3],"projected":[0.01,0.0]}]}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::engine::GestureEngine;
use crate::error::{EngineError, TraceError};
use crate::provider::{ControllerPose, PoseProvider};
use crate::tracker::NUM_CONTROLLERS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceFrame {
    pub t_ms: f64,
    #[serde(default)]
    pub connect: Vec<usize>,
    #[serde(default)]
    pub disconnect: Vec<usize>,
    /// Per-controller poses; `null` marks lost tracking. Controllers past
    /// the end of the list keep their previous pose.
    #[serde(default)]
    pub poses: Vec<Option<ControllerPose>>,
}

/// Pose provider fed from trace frames (or set directly by a host).
#[derive(Debug, Clone)]
pub struct TraceProvider {
    screen_mm: Vec2,
    poses: [Option<ControllerPose>; NUM_CONTROLLERS],
}

impl TraceProvider {
    pub fn new(screen_mm: Vec2) -> Self {
        Self {
            screen_mm,
            poses: [None; NUM_CONTROLLERS],
        }
    }

    pub fn set_pose(&mut self, controller: usize, pose: Option<ControllerPose>) {
        if let Some(slot) = self.poses.get_mut(controller) {
            *slot = pose;
        }
    }

    pub fn set_projected(&mut self, controller: usize, projected: Vec2) {
        self.set_pose(
            controller,
            Some(ControllerPose {
                world: Vec3::ZERO,
                projected,
            }),
        );
    }

    pub fn apply(&mut self, frame: &TraceFrame) {
        for (c, pose) in frame.poses.iter().enumerate().take(NUM_CONTROLLERS) {
            self.poses[c] = *pose;
        }
    }
}

impl PoseProvider for TraceProvider {
    fn controller_pose(&self, controller: usize) -> Option<ControllerPose> {
        self.poses.get(controller).copied().flatten()
    }

    fn screen_size_mm(&self) -> Vec2 {
        self.screen_mm
    }
}

pub fn parse_trace(text: &str) -> Result<Vec<TraceFrame>, TraceError> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line_no, line)| {
            serde_json::from_str(line).map_err(|source| TraceError::Parse {
                line: line_no,
                source,
            })
        })
        .collect()
}

/// Drive `engine` through `frames`: poses first, then connection changes,
/// then one tick per frame. Returns the number of events published.
pub fn replay(
    engine: &mut GestureEngine<TraceProvider>,
    frames: &[TraceFrame],
) -> Result<usize, EngineError> {
    let mut published = 0;
    for frame in frames {
        engine.provider_mut().apply(frame);
        for &c in &frame.connect {
            engine.controller_connected(c, frame.t_ms)?;
        }
        for &c in &frame.disconnect {
            engine.controller_disconnected(c, frame.t_ms)?;
        }
        published += engine.update(frame.t_ms)?.len();
    }
    Ok(published)
}
