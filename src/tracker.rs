//! Per-channel kinematic sampling.
//!
//! Each channel keeps a short history of projected 2D positions and derives
//! displacement, radius, unwrapped angle, path length, turn angle and their
//! ratios against the channel clock. Nothing here knows about gestures.

use glam::{Vec2, Vec3};

use crate::config::SamplerConfig;
use crate::ring::RingBuffer;

pub const NUM_CONTROLLERS: usize = 2;
/// Synthesized channel following the midpoint of both controllers.
pub const PAIR: usize = 2;
/// Duration-only channel running while at least one controller is connected.
pub const IDLE: usize = 3;
pub const NUM_CHANNELS: usize = 4;

/// Start/stop stopwatch over host-supplied timestamps. Elapsed time is read,
/// never pushed, and freezes at `stop`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Clock {
    started_at: Option<f64>,
    stopped_at: Option<f64>,
}

impl Clock {
    pub fn start(&mut self, now_ms: f64) {
        self.started_at = Some(now_ms);
        self.stopped_at = None;
    }

    pub fn stop(&mut self, now_ms: f64) {
        if self.started_at.is_some() && self.stopped_at.is_none() {
            self.stopped_at = Some(now_ms);
        }
    }

    pub fn started_at(&self) -> Option<f64> {
        self.started_at
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some() && self.stopped_at.is_none()
    }

    pub fn elapsed_ms(&self, now_ms: f64) -> f64 {
        match (self.started_at, self.stopped_at) {
            (Some(start), Some(stop)) => stop - start,
            (Some(start), None) => (now_ms - start).max(0.0),
            _ => 0.0,
        }
    }
}

/// Shortest signed step from `from` to `to`, in [-180, 180).
pub fn shortest_delta_deg(from: f32, to: f32) -> f32 {
    (to - from + 180.0).rem_euclid(360.0) - 180.0
}

/// Angle of `v` in degrees, or 0 inside the dead zone around the origin.
pub fn raw_angle_deg(v: Vec2, dead_zone: f32) -> f32 {
    if v.length() < dead_zone {
        0.0
    } else {
        v.y.atan2(v.x).to_degrees()
    }
}

/// `num / den`, or 0 when `den` is too small to divide by.
pub fn guarded_ratio(num: f32, den: f32, floor: f32) -> f32 {
    if !den.is_finite() || den.abs() < floor.max(f32::EPSILON) {
        0.0
    } else {
        num / den
    }
}

#[derive(Debug, Clone)]
pub struct Channel {
    pub connected: bool,
    pub clock: Clock,
    pub raw_position: Vec3,
    positions: RingBuffer<Vec2>,
    smoothed: RingBuffer<Vec2>,
    /// Baseline captured from the first smoothed sample after (re)start.
    pub center: Vec2,
    pub displacement: Vec2,
    pub radius: f32,
    /// Accumulated, never wrapped.
    pub angle: f32,
    pub path_length: f32,
    pub turn_angle: f32,
    pub radial_speed: f32,
    pub angular_speed: f32,
    pub path_speed: f32,
    /// Degrees turned per millimetre travelled.
    pub turn_deviation: f32,
    samples: u64,
}

impl Channel {
    pub fn new(past_length: usize) -> Self {
        Self {
            connected: false,
            clock: Clock::default(),
            raw_position: Vec3::ZERO,
            positions: RingBuffer::new(past_length),
            smoothed: RingBuffer::new(past_length),
            center: Vec2::ZERO,
            displacement: Vec2::ZERO,
            radius: 0.0,
            angle: 0.0,
            path_length: 0.0,
            turn_angle: 0.0,
            radial_speed: 0.0,
            angular_speed: 0.0,
            path_speed: 0.0,
            turn_deviation: 0.0,
            samples: 0,
        }
    }

    /// Clear kinematics and restart the clock. The last raw pose survives.
    pub fn start(&mut self, now_ms: f64) {
        let raw = self.raw_position;
        *self = Self::new(self.positions.capacity());
        self.raw_position = raw;
        self.connected = true;
        self.clock.start(now_ms);
    }

    /// Freeze: kinematics keep their last values, the clock stops.
    pub fn stop(&mut self, now_ms: f64) {
        self.connected = false;
        self.clock.stop(now_ms);
    }

    pub fn elapsed_ms(&self, now_ms: f64) -> f64 {
        self.clock.elapsed_ms(now_ms)
    }

    /// Number of samples taken since the last start.
    pub fn sample_count(&self) -> u64 {
        self.samples
    }

    pub fn latest_smoothed(&self) -> Option<Vec2> {
        self.smoothed.latest()
    }

    pub fn latest_position(&self) -> Option<Vec2> {
        self.positions.latest()
    }

    /// Fold one projected sample (mm) into the channel. No-op while disconnected.
    pub fn sample(&mut self, position: Vec2, raw: Vec3, now_ms: f64, cfg: &SamplerConfig) {
        if !self.connected {
            return;
        }
        self.raw_position = raw;
        self.positions.push(position);

        let window = cfg.smooth_window.max(1);
        let (sum, n) = self
            .positions
            .iter()
            .take(window)
            .fold((Vec2::ZERO, 0u32), |(acc, n), p| (acc + p, n + 1));
        let smooth = sum / n.max(1) as f32;
        self.smoothed.push(smooth);

        if self.samples == 0 {
            self.center = smooth;
        }
        self.samples += 1;

        self.displacement = smooth - self.center;
        self.radius = self.displacement.length();

        let raw_angle = raw_angle_deg(self.displacement, cfg.angle_dead_zone_mm);
        let delta = shortest_delta_deg(self.angle, raw_angle);
        self.angle += delta;

        if let (Some(cur), Some(prev)) = (self.smoothed.get(0), self.smoothed.get(1)) {
            let step = cur.distance(prev);
            if step >= cfg.path_noise_floor_mm {
                self.path_length += step;
            }
            let turn = delta.abs();
            if turn >= cfg.turn_noise_floor_deg {
                self.turn_angle += turn;
            }
        }

        let elapsed = self.elapsed_ms(now_ms) as f32;
        self.radial_speed = guarded_ratio(self.radius, elapsed, cfg.min_elapsed_ms);
        self.angular_speed = guarded_ratio(self.angle, elapsed, cfg.min_elapsed_ms);
        self.path_speed = guarded_ratio(self.path_length, elapsed, cfg.min_elapsed_ms);
        self.turn_deviation = guarded_ratio(self.turn_angle, self.path_length, cfg.min_path_mm);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(now: f64) -> Channel {
        let mut ch = Channel::new(8);
        ch.start(now);
        ch
    }

    fn feed(ch: &mut Channel, p: Vec2, now: f64) {
        ch.sample(p, Vec3::ZERO, now, &SamplerConfig::default());
    }

    #[test]
    fn test_shortest_delta_wraps() {
        assert_eq!(shortest_delta_deg(170.0, -175.0), 15.0);
        assert_eq!(shortest_delta_deg(-175.0, 170.0), -15.0);
        assert_eq!(shortest_delta_deg(725.0, 10.0), 5.0);
        assert_eq!(shortest_delta_deg(0.0, 90.0), 90.0);
    }

    #[test]
    fn test_guarded_ratio() {
        assert_eq!(guarded_ratio(5.0, 0.0, 1.0), 0.0);
        assert_eq!(guarded_ratio(5.0, 0.5, 1.0), 0.0);
        assert_eq!(guarded_ratio(5.0, 2.0, 1.0), 2.5);
        assert_eq!(guarded_ratio(5.0, f32::NAN, 1.0), 0.0);
    }

    #[test]
    fn test_clock_freezes_on_stop() {
        let mut clock = Clock::default();
        assert_eq!(clock.elapsed_ms(50.0), 0.0);
        clock.start(10.0);
        assert_eq!(clock.elapsed_ms(40.0), 30.0);
        clock.stop(60.0);
        assert_eq!(clock.elapsed_ms(500.0), 50.0);
        assert!(!clock.is_running());
    }

    #[test]
    fn test_first_sample_sets_center() {
        let mut ch = started(0.0);
        feed(&mut ch, Vec2::new(4.0, -2.0), 10.0);
        assert_eq!(ch.center, Vec2::new(4.0, -2.0));
        assert_eq!(ch.radius, 0.0);
        assert_eq!(ch.angle, 0.0);

        feed(&mut ch, Vec2::new(7.0, 2.0), 20.0);
        assert_eq!(ch.displacement, Vec2::new(3.0, 4.0));
        assert!((ch.radius - 5.0).abs() < 1e-5);
        assert!((ch.radial_speed - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_disconnected_channel_ignores_samples() {
        let mut ch = Channel::new(8);
        feed(&mut ch, Vec2::new(1.0, 1.0), 0.0);
        assert_eq!(ch.sample_count(), 0);
        assert!(ch.latest_position().is_none());
    }

    #[test]
    fn test_identical_samples_leave_path_and_turn() {
        let mut ch = started(0.0);
        feed(&mut ch, Vec2::ZERO, 10.0);
        feed(&mut ch, Vec2::new(5.0, 0.0), 20.0);
        feed(&mut ch, Vec2::new(5.0, 5.0), 30.0);
        let (path, turn) = (ch.path_length, ch.turn_angle);
        feed(&mut ch, Vec2::new(5.0, 5.0), 40.0);
        assert_eq!(ch.path_length, path);
        assert_eq!(ch.turn_angle, turn);
    }

    #[test]
    fn test_jitter_below_noise_floor_ignored() {
        let mut ch = started(0.0);
        feed(&mut ch, Vec2::ZERO, 10.0);
        feed(&mut ch, Vec2::new(0.05, 0.0), 20.0);
        feed(&mut ch, Vec2::new(0.0, 0.05), 30.0);
        assert_eq!(ch.path_length, 0.0);
        assert_eq!(ch.turn_deviation, 0.0);
    }

    #[test]
    fn test_angle_continuous_across_wrap() {
        let mut ch = started(0.0);
        feed(&mut ch, Vec2::ZERO, 10.0);
        let mut last = f32::NEG_INFINITY;
        // two full orbits at constant radius through the ±180° seam
        for (i, deg) in (0..=720).step_by(5).enumerate() {
            let rad = (deg as f32).to_radians();
            feed(&mut ch, Vec2::new(rad.cos(), rad.sin()) * 20.0, 20.0 + i as f64 * 10.0);
            assert!(ch.angle >= last, "angle jumped from {last} to {}", ch.angle);
            last = ch.angle;
        }
        assert!((ch.angle - 720.0).abs() < 1e-2);
        assert!(ch.turn_angle > 700.0);
    }

    #[test]
    fn test_dead_zone_reads_zero_angle() {
        let mut ch = started(0.0);
        feed(&mut ch, Vec2::ZERO, 10.0);
        feed(&mut ch, Vec2::new(0.0, 0.05), 20.0);
        assert_eq!(ch.angle, 0.0);
    }

    #[test]
    fn test_smoothing_window_averages() {
        let cfg = SamplerConfig {
            smooth_window: 2,
            ..SamplerConfig::default()
        };
        let mut ch = started(0.0);
        ch.sample(Vec2::ZERO, Vec3::ZERO, 10.0, &cfg);
        ch.sample(Vec2::new(4.0, 0.0), Vec3::ZERO, 20.0, &cfg);
        assert_eq!(ch.latest_smoothed(), Some(Vec2::new(2.0, 0.0)));
        assert_eq!(ch.latest_position(), Some(Vec2::new(4.0, 0.0)));
    }

    #[test]
    fn test_restart_resets_baseline() {
        let mut ch = started(0.0);
        feed(&mut ch, Vec2::ZERO, 10.0);
        feed(&mut ch, Vec2::new(10.0, 0.0), 20.0);
        ch.stop(30.0);
        assert_eq!(ch.radius, 10.0);
        ch.start(100.0);
        assert_eq!(ch.radius, 0.0);
        assert_eq!(ch.sample_count(), 0);
        feed(&mut ch, Vec2::new(10.0, 0.0), 110.0);
        assert_eq!(ch.center, Vec2::new(10.0, 0.0));
    }
}
