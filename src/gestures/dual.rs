//! Detectors reading the gap between both controllers: pinch, twist and the
//! explode/implode bursts.

use super::{DetectorBank, Emit, Frame, GestureData, GestureKind, Phase};
use crate::config::{BurstConfig, PinchConfig, TwistConfig};

impl DetectorBank {
    /// Slow change of separation at a steady angle.
    pub(super) fn pinch(&mut self, cfg: &PinchConfig, f: &Frame<'_>, em: &mut Emit<'_>) {
        let kind = GestureKind::Pinch;
        match self.state(kind).phase {
            Phase::Idle => {
                if !cfg.enabled || self.active.is_some() || f.connected != 2 {
                    return;
                }
                let p = f.pair;
                if p.axis().is_none()
                    || !(p.gap_diameter.abs() > cfg.min_gap_diameter_mm)
                    || !(p.gap_angle.abs() < cfg.max_gap_angle_deg)
                    || !(p.gap_diametral_speed.abs() < cfg.max_gap_speed)
                {
                    return;
                }
                let scale = p.scale(f.sampler);
                let data = GestureData::Pinch {
                    start_scale: scale,
                    scale,
                    delta: 0.0,
                };
                self.begin(kind, data, em);
            }
            Phase::Start | Phase::Current => {
                if f.connected != 2 {
                    self.finish(kind, em);
                    return;
                }
                let GestureData::Pinch {
                    start_scale,
                    scale: last,
                    ..
                } = self.state(kind).data
                else {
                    return;
                };
                let scale = f.pair.scale(f.sampler);
                let data = GestureData::Pinch {
                    start_scale,
                    scale,
                    delta: scale - last,
                };
                self.progress(kind, data, em);
            }
            Phase::End => {}
        }
    }

    /// Rotation of the pair at a steady separation.
    pub(super) fn twist(&mut self, cfg: &TwistConfig, f: &Frame<'_>, em: &mut Emit<'_>) {
        let kind = GestureKind::Twist;
        match self.state(kind).phase {
            Phase::Idle => {
                if !cfg.enabled || self.active.is_some() || f.connected != 2 {
                    return;
                }
                let p = f.pair;
                if p.axis().is_none()
                    || !(p.diameter > cfg.min_pair_diameter_mm)
                    || !(p.gap_diameter.abs() < cfg.max_gap_diameter_mm)
                    || !(p.gap_angle.abs() > cfg.min_gap_angle_deg)
                {
                    return;
                }
                let data = GestureData::Twist {
                    start_theta: p.gap_angle,
                    theta: p.gap_angle,
                    delta: 0.0,
                };
                self.begin(kind, data, em);
            }
            Phase::Start | Phase::Current => {
                if f.connected != 2 {
                    self.finish(kind, em);
                    return;
                }
                let GestureData::Twist {
                    start_theta,
                    theta: last,
                    ..
                } = self.state(kind).data
                else {
                    return;
                };
                let theta = f.pair.gap_angle;
                let data = GestureData::Twist {
                    start_theta,
                    theta,
                    delta: theta - last,
                };
                self.progress(kind, data, em);
            }
            Phase::End => {}
        }
    }

    /// Fast spread (`sign` 1.0) or squeeze (`sign` -1.0). Fires once per
    /// two-controller session.
    pub(super) fn burst(
        &mut self,
        kind: GestureKind,
        sign: f32,
        cfg: &BurstConfig,
        f: &Frame<'_>,
        em: &mut Emit<'_>,
    ) {
        if !cfg.enabled || f.connected != 2 || self.active.is_some() || self.state(kind).latched {
            return;
        }
        let p = f.pair;
        if p.axis().is_none()
            || !(p.gap_diameter * sign > cfg.min_gap_diameter_mm)
            || !(p.gap_diametral_speed * sign > cfg.min_gap_speed)
        {
            return;
        }
        let data = GestureData::Burst {
            gap_mm: p.gap_diameter,
            speed: p.gap_diametral_speed,
        };
        self.pulse(kind, data, em);
        self.state_mut(kind).latched = true;
    }
}
