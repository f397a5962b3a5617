//! Two-controller aggregate: live separation and its deviation ("gap") from
//! the separation captured when the second controller connected.

use glam::Vec2;

use crate::config::SamplerConfig;
use crate::ring::RingBuffer;
use crate::tracker::{guarded_ratio, raw_angle_deg, shortest_delta_deg};

#[derive(Debug, Clone, Copy, Default)]
struct GapSample {
    time_ms: f64,
    diameter: f32,
    angle: f32,
}

#[derive(Debug, Clone)]
pub struct PairState {
    axis: Option<Vec2>,
    axis_angle: f32,
    /// second-connected minus first-connected position
    pub separation: Vec2,
    pub diameter: f32,
    pub angle: f32,
    pub gap_diameter: f32,
    pub gap_angle: f32,
    pub gap_diametral_speed: f32,
    pub gap_angular_speed: f32,
    gaps: RingBuffer<GapSample>,
}

impl PairState {
    pub fn new(past_length: usize) -> Self {
        Self {
            axis: None,
            axis_angle: 0.0,
            separation: Vec2::ZERO,
            diameter: 0.0,
            angle: 0.0,
            gap_diameter: 0.0,
            gap_angle: 0.0,
            gap_diametral_speed: 0.0,
            gap_angular_speed: 0.0,
            gaps: RingBuffer::new(past_length),
        }
    }

    /// Forget the baseline; the next `update` captures a new axis.
    pub fn reset(&mut self) {
        *self = Self::new(self.gaps.capacity());
    }

    pub fn axis(&self) -> Option<Vec2> {
        self.axis
    }

    pub fn axis_angle(&self) -> f32 {
        self.axis_angle
    }

    /// `diameter / |axis|`, 1.0 until an axis with usable length exists.
    pub fn scale(&self, cfg: &SamplerConfig) -> f32 {
        match self.axis {
            Some(axis) if axis.length() >= cfg.angle_dead_zone_mm.max(f32::EPSILON) => {
                self.diameter / axis.length()
            }
            _ => 1.0,
        }
    }

    /// `first`/`second` are the smoothed positions ordered by connection time.
    pub fn update(&mut self, first: Vec2, second: Vec2, now_ms: f64, cfg: &SamplerConfig) {
        self.separation = second - first;
        self.diameter = self.separation.length();
        let raw = raw_angle_deg(self.separation, cfg.angle_dead_zone_mm);

        let axis = match self.axis {
            Some(axis) => {
                self.angle += shortest_delta_deg(self.angle, raw);
                axis
            }
            None => {
                self.axis = Some(self.separation);
                self.axis_angle = raw;
                self.angle = raw;
                self.separation
            }
        };

        self.gap_diameter = self.diameter - axis.length();
        self.gap_angle = self.angle - self.axis_angle;

        self.gaps.push(GapSample {
            time_ms: now_ms,
            diameter: self.gap_diameter,
            angle: self.gap_angle,
        });
        if let (Some(new), Some(old)) = (self.gaps.latest(), self.gaps.oldest()) {
            let dt = (new.time_ms - old.time_ms) as f32;
            self.gap_diametral_speed =
                guarded_ratio(new.diameter - old.diameter, dt, cfg.min_elapsed_ms);
            self.gap_angular_speed = guarded_ratio(new.angle - old.angle, dt, cfg.min_elapsed_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SamplerConfig {
        SamplerConfig::default()
    }

    #[test]
    fn test_gap_is_zero_at_capture() {
        let mut pair = PairState::new(8);
        assert!(pair.axis().is_none());
        pair.update(Vec2::new(-50.0, 0.0), Vec2::new(50.0, 0.0), 0.0, &cfg());
        assert_eq!(pair.axis(), Some(Vec2::new(100.0, 0.0)));
        assert_eq!(pair.gap_diameter, 0.0);
        assert_eq!(pair.gap_angle, 0.0);
        assert_eq!(pair.gap_diametral_speed, 0.0);
        assert_eq!(pair.scale(&cfg()), 1.0);
    }

    #[test]
    fn test_gap_tracks_spread_and_speed() {
        let mut pair = PairState::new(8);
        for i in 0..=5 {
            let s = i as f32 * 2.0;
            pair.update(
                Vec2::new(-50.0 - s, 0.0),
                Vec2::new(50.0 + s, 0.0),
                i as f64 * 10.0,
                &cfg(),
            );
        }
        assert!((pair.gap_diameter - 20.0).abs() < 1e-4);
        // 20 mm over 50 ms
        assert!((pair.gap_diametral_speed - 0.4).abs() < 1e-4);
        assert!((pair.scale(&cfg()) - 1.2).abs() < 1e-4);
    }

    #[test]
    fn test_gap_angle_follows_rotation_across_seam() {
        let mut pair = PairState::new(8);
        // axis points left (180°), then rotates past the seam
        for (i, deg) in [180.0_f32, 190.0, 200.0, 210.0].iter().enumerate() {
            let dir = Vec2::new(deg.to_radians().cos(), deg.to_radians().sin());
            pair.update(Vec2::ZERO, dir * 60.0, i as f64 * 10.0, &cfg());
        }
        assert!((pair.gap_angle - 30.0).abs() < 1e-3);
        assert!(pair.gap_diameter.abs() < 1e-3);
        assert!((pair.gap_angular_speed - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_reset_recaptures_axis() {
        let mut pair = PairState::new(8);
        pair.update(Vec2::ZERO, Vec2::new(10.0, 0.0), 0.0, &cfg());
        pair.update(Vec2::ZERO, Vec2::new(20.0, 0.0), 10.0, &cfg());
        pair.reset();
        assert!(pair.axis().is_none());
        pair.update(Vec2::ZERO, Vec2::new(0.0, 30.0), 20.0, &cfg());
        assert_eq!(pair.axis(), Some(Vec2::new(0.0, 30.0)));
        assert!((pair.axis_angle() - 90.0).abs() < 1e-4);
        assert_eq!(pair.gap_diameter, 0.0);
    }
}
