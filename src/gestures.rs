//! Gesture vocabulary and the detector bank.
//!
//! Every gesture owns one state machine (idle → start → current → end) that
//! is polled once per tick in priority order. Exclusive gestures hold the
//! shared token while active; single-shot gestures fire one `instant` event
//! and only while the token is free. Any end starts the global cooldown.

mod dual;
mod single;

use glam::Vec2;
use log::debug;
use serde::Serialize;
use std::{fmt, str::FromStr};

use crate::config::{SamplerConfig, Thresholds};
use crate::error::UnknownGesture;
use crate::events::{EventPhase, GestureEvent};
use crate::lifecycle::Lifecycle;
use crate::pair::PairState;
use crate::timers::TimerToken;
use crate::tracker::{Channel, NUM_CHANNELS, NUM_CONTROLLERS, PAIR};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureKind {
    Tap,
    PolyTap,
    Swipe,
    Hold,
    Pan,
    Glide,
    Swirl,
    Pinch,
    Twist,
    DualSwipe,
    DualHold,
    DualPan,
    Explode,
    Implode,
}

impl GestureKind {
    /// Detector priority order.
    pub const ALL: [GestureKind; 14] = [
        Self::Tap,
        Self::PolyTap,
        Self::Swipe,
        Self::Hold,
        Self::Pan,
        Self::Glide,
        Self::Swirl,
        Self::Pinch,
        Self::Twist,
        Self::DualSwipe,
        Self::DualHold,
        Self::DualPan,
        Self::Explode,
        Self::Implode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tap => "tap",
            Self::PolyTap => "polytap",
            Self::Swipe => "swipe",
            Self::Hold => "hold",
            Self::Pan => "pan",
            Self::Glide => "glide",
            Self::Swirl => "swirl",
            Self::Pinch => "pinch",
            Self::Twist => "twist",
            Self::DualSwipe => "dualswipe",
            Self::DualHold => "dualhold",
            Self::DualPan => "dualpan",
            Self::Explode => "explode",
            Self::Implode => "implode",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }

    /// Holds the shared token from start to end.
    pub fn is_exclusive(&self) -> bool {
        matches!(
            self,
            Self::Hold
                | Self::Pan
                | Self::Glide
                | Self::Swirl
                | Self::Pinch
                | Self::Twist
                | Self::DualHold
                | Self::DualPan
        )
    }
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GestureKind {
    type Err = UnknownGesture;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == name)
            .ok_or_else(|| UnknownGesture(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Sign of the dominant axis; equal magnitudes resolve vertically.
    /// `None` for a zero (or non-finite) vector.
    pub fn dominant(v: Vec2) -> Option<Self> {
        if !v.is_finite() || v == Vec2::ZERO {
            return None;
        }
        Some(if v.x.abs() > v.y.abs() {
            if v.x > 0.0 { Self::Right } else { Self::Left }
        } else if v.y > 0.0 {
            Self::Up
        } else {
            Self::Down
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
        }
    }
}

/// Per-instance runtime of a gesture, one variant per gesture family.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GestureData {
    #[default]
    Empty,
    Tap {
        controller: usize,
        position: Vec2,
        duration_ms: f64,
    },
    PolyTap {
        num_taps: u32,
    },
    Swipe {
        direction: Direction,
        distance_mm: f32,
        speed: f32,
    },
    Hold {
        channel: usize,
        origin: Vec2,
        duration_ms: f64,
    },
    Pan {
        channel: usize,
        origin: Vec2,
        delta: Vec2,
    },
    Glide {
        channel: usize,
        path_mm: f32,
        delta: Vec2,
    },
    Swirl {
        channel: usize,
        theta: f32,
        turns: f32,
    },
    Pinch {
        start_scale: f32,
        scale: f32,
        delta: f32,
    },
    Twist {
        start_theta: f32,
        theta: f32,
        delta: f32,
    },
    Burst {
        gap_mm: f32,
        speed: f32,
    },
}

impl GestureData {
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Self::Swipe { direction, .. } => Some(*direction),
            _ => None,
        }
    }

    pub fn num_taps(&self) -> Option<u32> {
        match self {
            Self::PolyTap { num_taps } => Some(*num_taps),
            _ => None,
        }
    }

    pub fn scale(&self) -> Option<f32> {
        match self {
            Self::Pinch { scale, .. } => Some(*scale),
            _ => None,
        }
    }

    pub fn theta(&self) -> Option<f32> {
        match self {
            Self::Twist { theta, .. } | Self::Swirl { theta, .. } => Some(*theta),
            _ => None,
        }
    }

    pub fn delta(&self) -> Option<Vec2> {
        match self {
            Self::Pan { delta, .. } | Self::Glide { delta, .. } => Some(*delta),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// One-tick pulse.
    Start,
    Current,
    /// One-tick pulse.
    End,
}

#[derive(Debug, Clone)]
pub struct GestureState {
    kind: GestureKind,
    phase: Phase,
    pub data: GestureData,
    /// Set after a burst fires; cleared once fewer than two controllers remain.
    latched: bool,
}

impl GestureState {
    fn new(kind: GestureKind) -> Self {
        Self {
            kind,
            phase: Phase::Idle,
            data: GestureData::Empty,
            latched: false,
        }
    }

    pub fn kind(&self) -> GestureKind {
        self.kind
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_start(&self) -> bool {
        self.phase == Phase::Start
    }

    /// True on the start tick and every tick after until the end.
    pub fn is_current(&self) -> bool {
        matches!(self.phase, Phase::Start | Phase::Current)
    }

    pub fn is_end(&self) -> bool {
        self.phase == Phase::End
    }

    fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.data = GestureData::Empty;
    }
}

/// Read-only kinematic view handed to every detector for one tick.
pub struct Frame<'a> {
    pub now_ms: f64,
    pub session_ms: f64,
    pub connected: usize,
    /// Connection count seen by the previous tick.
    pub prev_connected: usize,
    /// Controllers whose disconnect was applied this tick.
    pub released: &'a [usize],
    pub channels: &'a [Channel; NUM_CHANNELS],
    pub pair: &'a PairState,
    pub sampler: &'a SamplerConfig,
}

impl Frame<'_> {
    /// Channel a gesture needing `required` controllers reads: the lone
    /// controller for one, the pair channel for two.
    fn channel_for(&self, required: usize) -> Option<usize> {
        if self.connected != required {
            return None;
        }
        match required {
            1 => (0..NUM_CONTROLLERS).find(|&c| self.channels[c].connected),
            2 => Some(PAIR),
            _ => None,
        }
    }

    /// Controller lifted on a 1 → 0 edge.
    fn released_single(&self) -> Option<usize> {
        if self.prev_connected == 1 && self.connected == 0 {
            self.released.first().copied()
        } else {
            None
        }
    }

    /// Pair channel on a 2 → fewer edge.
    fn released_pair(&self) -> Option<usize> {
        (self.prev_connected == 2 && self.connected < 2).then_some(PAIR)
    }
}

struct Emit<'a> {
    now_ms: f64,
    session_ms: f64,
    lifecycle: &'a mut Lifecycle,
    events: &'a mut Vec<GestureEvent>,
}

#[derive(Debug)]
pub struct DetectorBank {
    states: [GestureState; 14],
    active: Option<GestureKind>,
    polytap_timer: Option<TimerToken>,
}

impl Default for DetectorBank {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBank {
    pub fn new() -> Self {
        Self {
            states: GestureKind::ALL.map(GestureState::new),
            active: None,
            polytap_timer: None,
        }
    }

    pub fn state(&self, kind: GestureKind) -> &GestureState {
        &self.states[kind.index()]
    }

    fn state_mut(&mut self, kind: GestureKind) -> &mut GestureState {
        &mut self.states[kind.index()]
    }

    pub fn active(&self) -> Option<GestureKind> {
        self.active
    }

    pub fn states(&self) -> impl Iterator<Item = &GestureState> {
        self.states.iter()
    }

    /// Age the one-tick pulses: start becomes current, end becomes idle.
    pub fn advance(&mut self) {
        for st in self.states.iter_mut() {
            match st.phase {
                Phase::Start => st.phase = Phase::Current,
                Phase::End => st.reset(),
                Phase::Idle | Phase::Current => {}
            }
        }
    }

    pub fn clear_latches(&mut self, connected: usize) {
        if connected < 2 {
            for st in self.states.iter_mut() {
                st.latched = false;
            }
        }
    }

    /// Poll every detector in priority order. Stops as soon as a detector
    /// ends a gesture, since that starts the cooldown.
    pub fn poll(
        &mut self,
        f: &Frame<'_>,
        th: &Thresholds,
        lifecycle: &mut Lifecycle,
    ) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        let mut em = Emit {
            now_ms: f.now_ms,
            session_ms: f.session_ms,
            lifecycle,
            events: &mut events,
        };
        for kind in GestureKind::ALL {
            if em.lifecycle.is_detection_paused() {
                break;
            }
            match kind {
                GestureKind::Tap => self.tap(f, &th.tap, &th.polytap, &mut em),
                GestureKind::PolyTap => self.polytap(f, &mut em),
                GestureKind::Swipe => self.swipe(kind, f.released_single(), &th.swipe, f, &mut em),
                GestureKind::Hold => self.hold(kind, 1, &th.hold, f, &mut em),
                GestureKind::Pan => self.pan(kind, 1, &th.pan, f, &mut em),
                GestureKind::Glide => self.glide(&th.glide, f, &mut em),
                GestureKind::Swirl => self.swirl(&th.swirl, f, &mut em),
                GestureKind::Pinch => self.pinch(&th.pinch, f, &mut em),
                GestureKind::Twist => self.twist(&th.twist, f, &mut em),
                GestureKind::DualSwipe => {
                    self.swipe(kind, f.released_pair(), &th.dualswipe, f, &mut em)
                }
                GestureKind::DualHold => self.hold(kind, 2, &th.dualhold, f, &mut em),
                GestureKind::DualPan => self.pan(kind, 2, &th.dualpan, f, &mut em),
                GestureKind::Explode => self.burst(kind, 1.0, &th.explode, f, &mut em),
                GestureKind::Implode => self.burst(kind, -1.0, &th.implode, f, &mut em),
            }
        }
        events
    }

    /// Poly-tap merge window ran out.
    pub fn polytap_timeout(
        &mut self,
        now_ms: f64,
        session_ms: f64,
        lifecycle: &mut Lifecycle,
    ) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        self.polytap_timer = None;
        if self.state(GestureKind::PolyTap).is_current() {
            let mut em = Emit {
                now_ms,
                session_ms,
                lifecycle,
                events: &mut events,
            };
            self.finish(GestureKind::PolyTap, &mut em);
        }
        events
    }

    fn begin(&mut self, kind: GestureKind, data: GestureData, em: &mut Emit<'_>) {
        let st = self.state_mut(kind);
        st.phase = Phase::Start;
        st.data = data.clone();
        if kind.is_exclusive() {
            self.active = Some(kind);
        }
        debug!("{kind} started at {:.1} ms", em.now_ms);
        em.events.push(GestureEvent::new(
            kind,
            EventPhase::Start,
            em.now_ms,
            em.session_ms,
            data,
        ));
    }

    fn progress(&mut self, kind: GestureKind, data: GestureData, em: &mut Emit<'_>) {
        self.state_mut(kind).data = data.clone();
        em.events.push(GestureEvent::new(
            kind,
            EventPhase::Current,
            em.now_ms,
            em.session_ms,
            data,
        ));
    }

    fn finish(&mut self, kind: GestureKind, em: &mut Emit<'_>) {
        let st = self.state_mut(kind);
        st.phase = Phase::End;
        let data = st.data.clone();
        if self.active == Some(kind) {
            self.active = None;
        }
        debug!("{kind} ended at {:.1} ms", em.now_ms);
        em.events.push(GestureEvent::new(
            kind,
            EventPhase::End,
            em.now_ms,
            em.session_ms,
            data,
        ));
        em.lifecycle.delay_detect_until(em.now_ms);
    }

    /// Start, current and end folded into one event.
    fn pulse(&mut self, kind: GestureKind, data: GestureData, em: &mut Emit<'_>) {
        let st = self.state_mut(kind);
        st.phase = Phase::End;
        st.data = data.clone();
        debug!("{kind} fired at {:.1} ms", em.now_ms);
        em.events.push(GestureEvent::new(
            kind,
            EventPhase::Instant,
            em.now_ms,
            em.session_ms,
            data,
        ));
        em.lifecycle.delay_detect_until(em.now_ms);
    }
}
