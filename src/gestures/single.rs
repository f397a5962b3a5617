//! Detectors reading one channel: tap, poly-tap, swipe, hold, pan, glide,
//! swirl. Hold, pan and swipe are shared with their two-handed variants,
//! which read the pair channel instead.

use glam::Vec2;

use super::{DetectorBank, Emit, Frame, GestureData, GestureKind, Phase};
use crate::config::{
    GlideConfig, HoldConfig, PanConfig, PolyTapConfig, SwipeConfig, SwirlConfig, TapConfig,
};
use crate::gestures::Direction;
use crate::lifecycle::Deferred;

impl DetectorBank {
    pub(super) fn tap(
        &mut self,
        f: &Frame<'_>,
        cfg: &TapConfig,
        poly: &PolyTapConfig,
        em: &mut Emit<'_>,
    ) {
        if !cfg.enabled || self.active.is_some() {
            return;
        }
        let Some(c) = f.released_single() else {
            return;
        };
        let ch = &f.channels[c];
        let duration = ch.elapsed_ms(f.now_ms);
        if ch.sample_count() == 0
            || !(ch.radius < cfg.max_radius_mm)
            || !(duration < cfg.max_duration_ms)
        {
            return;
        }
        let data = GestureData::Tap {
            controller: c,
            position: ch.center,
            duration_ms: duration,
        };
        self.pulse(GestureKind::Tap, data, em);
        self.register_tap(poly, em);
    }

    /// Feed a detected tap into the poly-tap window: start it, or count the
    /// tap and restart the merge timer.
    fn register_tap(&mut self, cfg: &PolyTapConfig, em: &mut Emit<'_>) {
        if !cfg.enabled {
            return;
        }
        if let Some(token) = self.polytap_timer.take() {
            em.lifecycle.cancel(token);
        }
        let kind = GestureKind::PolyTap;
        if self.state(kind).is_current() {
            let num_taps = self.state(kind).data.num_taps().unwrap_or(0) + 1;
            self.progress(kind, GestureData::PolyTap { num_taps }, em);
        } else {
            self.begin(kind, GestureData::PolyTap { num_taps: 1 }, em);
        }
        let due = em.now_ms + cfg.window_ms;
        self.polytap_timer = Some(em.lifecycle.schedule(due, Deferred::PolyTapTimeout));
    }

    /// Ends an open poly-tap early once a second controller joins.
    pub(super) fn polytap(&mut self, f: &Frame<'_>, em: &mut Emit<'_>) {
        if !self.state(GestureKind::PolyTap).is_current() || f.connected < 2 {
            return;
        }
        if let Some(token) = self.polytap_timer.take() {
            em.lifecycle.cancel(token);
        }
        self.finish(GestureKind::PolyTap, em);
    }

    /// Fires on a release edge when the released channel travelled far and
    /// fast enough.
    pub(super) fn swipe(
        &mut self,
        kind: GestureKind,
        channel: Option<usize>,
        cfg: &SwipeConfig,
        f: &Frame<'_>,
        em: &mut Emit<'_>,
    ) {
        if !cfg.enabled || self.active.is_some() {
            return;
        }
        let Some(c) = channel else {
            return;
        };
        let ch = &f.channels[c];
        if ch.sample_count() < 2
            || !(ch.radius > cfg.min_radius_mm)
            || !(ch.radial_speed > cfg.min_speed)
        {
            return;
        }
        if let Some(max) = cfg.max_duration_ms {
            if !(ch.elapsed_ms(f.now_ms) < max) {
                return;
            }
        }
        let Some(direction) = Direction::dominant(ch.displacement) else {
            return;
        };
        let data = GestureData::Swipe {
            direction,
            distance_mm: ch.radius,
            speed: ch.radial_speed,
        };
        self.pulse(kind, data, em);
    }

    /// Ends `kind` if its channel was released; true when it did.
    fn end_if_released(
        &mut self,
        kind: GestureKind,
        required: usize,
        channel: usize,
        f: &Frame<'_>,
        em: &mut Emit<'_>,
    ) -> bool {
        if f.connected != required || !f.channels[channel].connected {
            self.finish(kind, em);
            return true;
        }
        false
    }

    pub(super) fn hold(
        &mut self,
        kind: GestureKind,
        required: usize,
        cfg: &HoldConfig,
        f: &Frame<'_>,
        em: &mut Emit<'_>,
    ) {
        match self.state(kind).phase {
            Phase::Idle => {
                if !cfg.enabled || self.active.is_some() {
                    return;
                }
                let Some(c) = f.channel_for(required) else {
                    return;
                };
                let ch = &f.channels[c];
                let duration = ch.elapsed_ms(f.now_ms);
                if ch.sample_count() == 0
                    || !(ch.radius < cfg.max_radius_mm)
                    || !(duration > cfg.min_duration_ms)
                {
                    return;
                }
                let data = GestureData::Hold {
                    channel: c,
                    origin: ch.center,
                    duration_ms: duration,
                };
                self.begin(kind, data, em);
            }
            Phase::Start | Phase::Current => {
                let GestureData::Hold {
                    channel, origin, ..
                } = self.state(kind).data
                else {
                    return;
                };
                if self.end_if_released(kind, required, channel, f, em) {
                    return;
                }
                let data = GestureData::Hold {
                    channel,
                    origin,
                    duration_ms: f.channels[channel].elapsed_ms(f.now_ms),
                };
                self.progress(kind, data, em);
            }
            Phase::End => {}
        }
    }

    pub(super) fn pan(
        &mut self,
        kind: GestureKind,
        required: usize,
        cfg: &PanConfig,
        f: &Frame<'_>,
        em: &mut Emit<'_>,
    ) {
        match self.state(kind).phase {
            Phase::Idle => {
                if !cfg.enabled || self.active.is_some() {
                    return;
                }
                let Some(c) = f.channel_for(required) else {
                    return;
                };
                let ch = &f.channels[c];
                if ch.sample_count() < 2
                    || !(ch.radius > cfg.min_radius_mm)
                    || !(ch.radial_speed < cfg.max_speed)
                {
                    return;
                }
                let data = GestureData::Pan {
                    channel: c,
                    origin: ch.displacement,
                    delta: Vec2::ZERO,
                };
                self.begin(kind, data, em);
            }
            Phase::Start | Phase::Current => {
                let GestureData::Pan {
                    channel, origin, ..
                } = self.state(kind).data
                else {
                    return;
                };
                if self.end_if_released(kind, required, channel, f, em) {
                    return;
                }
                let data = GestureData::Pan {
                    channel,
                    origin,
                    delta: f.channels[channel].displacement - origin,
                };
                self.progress(kind, data, em);
            }
            Phase::End => {}
        }
    }

    /// Long, fast, nearly straight travel.
    pub(super) fn glide(&mut self, cfg: &GlideConfig, f: &Frame<'_>, em: &mut Emit<'_>) {
        let kind = GestureKind::Glide;
        match self.state(kind).phase {
            Phase::Idle => {
                if !cfg.enabled || self.active.is_some() {
                    return;
                }
                let Some(c) = f.channel_for(1) else {
                    return;
                };
                let ch = &f.channels[c];
                if !(ch.path_length > cfg.min_path_mm)
                    || !(ch.path_speed > cfg.min_path_speed)
                    || !(ch.turn_deviation < cfg.max_turn_deviation)
                {
                    return;
                }
                let data = GestureData::Glide {
                    channel: c,
                    path_mm: ch.path_length,
                    delta: ch.displacement,
                };
                self.begin(kind, data, em);
            }
            Phase::Start | Phase::Current => {
                let GestureData::Glide { channel, .. } = self.state(kind).data else {
                    return;
                };
                if self.end_if_released(kind, 1, channel, f, em) {
                    return;
                }
                let ch = &f.channels[channel];
                let data = GestureData::Glide {
                    channel,
                    path_mm: ch.path_length,
                    delta: ch.displacement,
                };
                self.progress(kind, data, em);
            }
            Phase::End => {}
        }
    }

    /// Circling around the start point.
    pub(super) fn swirl(&mut self, cfg: &SwirlConfig, f: &Frame<'_>, em: &mut Emit<'_>) {
        let kind = GestureKind::Swirl;
        match self.state(kind).phase {
            Phase::Idle => {
                if !cfg.enabled || self.active.is_some() {
                    return;
                }
                let Some(c) = f.channel_for(1) else {
                    return;
                };
                let ch = &f.channels[c];
                if !(ch.turn_angle > cfg.min_turn_deg)
                    || !(ch.turn_deviation > cfg.min_turn_deviation)
                {
                    return;
                }
                let data = GestureData::Swirl {
                    channel: c,
                    theta: ch.angle,
                    turns: ch.angle / 360.0,
                };
                self.begin(kind, data, em);
            }
            Phase::Start | Phase::Current => {
                let GestureData::Swirl { channel, .. } = self.state(kind).data else {
                    return;
                };
                if self.end_if_released(kind, 1, channel, f, em) {
                    return;
                }
                let angle = f.channels[channel].angle;
                let data = GestureData::Swirl {
                    channel,
                    theta: angle,
                    turns: angle / 360.0,
                };
                self.progress(kind, data, em);
            }
            Phase::End => {}
        }
    }
}
