use log::info;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Meta {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// History sizes and noise floors for the kinematic sampler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    pub past_length: usize,
    pub smooth_window: usize,
    /// Below this radius the raw angle reads as 0°.
    pub angle_dead_zone_mm: f32,
    pub path_noise_floor_mm: f32,
    pub turn_noise_floor_deg: f32,
    /// Durations shorter than this make every speed read 0.
    pub min_elapsed_ms: f32,
    /// Path lengths shorter than this make turn deviation read 0.
    pub min_path_mm: f32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            past_length: 8,
            smooth_window: 1,
            angle_dead_zone_mm: 0.1,
            path_noise_floor_mm: 0.15,
            turn_noise_floor_deg: 1.0,
            min_elapsed_ms: 1.0,
            min_path_mm: 0.01,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub connect_debounce_ms: f64,
    pub detect_delay_ms: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            connect_debounce_ms: 20.0,
            detect_delay_ms: 150.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TapConfig {
    pub enabled: bool,
    pub max_radius_mm: f32,
    pub max_duration_ms: f64,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_radius_mm: 10.0,
            max_duration_ms: 150.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolyTapConfig {
    pub enabled: bool,
    pub window_ms: f64,
}

impl Default for PolyTapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_ms: 300.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwipeConfig {
    pub enabled: bool,
    pub min_radius_mm: f32,
    /// mm/ms
    pub min_speed: f32,
    pub max_duration_ms: Option<f64>,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_radius_mm: 12.0,
            min_speed: 0.1,
            max_duration_ms: Some(300.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HoldConfig {
    pub enabled: bool,
    pub max_radius_mm: f32,
    pub min_duration_ms: f64,
}

impl Default for HoldConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_radius_mm: 3.0,
            min_duration_ms: 500.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PanConfig {
    pub enabled: bool,
    pub min_radius_mm: f32,
    pub max_speed: f32,
}

impl Default for PanConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_radius_mm: 3.0,
            max_speed: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlideConfig {
    pub enabled: bool,
    pub min_path_mm: f32,
    pub min_path_speed: f32,
    /// deg/mm
    pub max_turn_deviation: f32,
}

impl Default for GlideConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_path_mm: 40.0,
            min_path_speed: 0.1,
            max_turn_deviation: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwirlConfig {
    pub enabled: bool,
    pub min_turn_deg: f32,
    /// deg/mm
    pub min_turn_deviation: f32,
}

impl Default for SwirlConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_turn_deg: 270.0,
            min_turn_deviation: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PinchConfig {
    pub enabled: bool,
    pub min_gap_diameter_mm: f32,
    pub max_gap_angle_deg: f32,
    pub max_gap_speed: f32,
}

impl Default for PinchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_gap_diameter_mm: 10.0,
            max_gap_angle_deg: 10.0,
            max_gap_speed: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwistConfig {
    pub enabled: bool,
    pub min_pair_diameter_mm: f32,
    pub max_gap_diameter_mm: f32,
    pub min_gap_angle_deg: f32,
}

impl Default for TwistConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_pair_diameter_mm: 30.0,
            max_gap_diameter_mm: 10.0,
            min_gap_angle_deg: 15.0,
        }
    }
}

/// Shared by explode (positive gap) and implode (negative gap).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BurstConfig {
    pub enabled: bool,
    pub min_gap_diameter_mm: f32,
    pub min_gap_speed: f32,
}

impl Default for BurstConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_gap_diameter_mm: 11.0,
            min_gap_speed: 0.12,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub tap: TapConfig,
    pub polytap: PolyTapConfig,
    pub swipe: SwipeConfig,
    pub hold: HoldConfig,
    pub pan: PanConfig,
    pub glide: GlideConfig,
    pub swirl: SwirlConfig,
    pub pinch: PinchConfig,
    pub twist: TwistConfig,
    pub dualswipe: SwipeConfig,
    pub dualhold: HoldConfig,
    pub dualpan: PanConfig,
    pub explode: BurstConfig,
    pub implode: BurstConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub meta: Meta,
    pub sampler: SamplerConfig,
    pub timing: TimingConfig,
    pub thresholds: Thresholds,
}

impl Profile {
    pub fn from_toml_str(txt: &str) -> Result<Self, ConfigError> {
        let profile: Profile = toml::from_str(txt).map_err(|e| ConfigError::Parse {
            path: "<inline>".into(),
            source: e,
        })?;
        validate_profile(&profile)?;
        Ok(profile)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let txt = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let profile: Profile = toml::from_str(&txt).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        validate_profile(&profile)?;
        info!(
            "loaded profile '{}' from {}",
            profile.meta.name.as_deref().unwrap_or("unnamed"),
            path.display()
        );
        Ok(profile)
    }
}

fn check(ok: bool, msg: impl FnOnce() -> String) -> Result<(), ConfigError> {
    if ok { Ok(()) } else { Err(ConfigError::Invalid(msg())) }
}

fn non_negative(name: &str, v: f64) -> Result<(), ConfigError> {
    check(v.is_finite() && v >= 0.0, || {
        format!("{name} must be a finite non-negative number, got {v}")
    })
}

pub fn validate_profile(p: &Profile) -> Result<(), ConfigError> {
    let s = &p.sampler;
    check(s.past_length >= 2, || {
        format!("sampler.past_length must be >= 2, got {}", s.past_length)
    })?;
    check((1..=s.past_length).contains(&s.smooth_window), || {
        format!(
            "sampler.smooth_window must be in 1..={}, got {}",
            s.past_length, s.smooth_window
        )
    })?;
    non_negative("sampler.angle_dead_zone_mm", s.angle_dead_zone_mm.into())?;
    non_negative("sampler.path_noise_floor_mm", s.path_noise_floor_mm.into())?;
    non_negative("sampler.turn_noise_floor_deg", s.turn_noise_floor_deg.into())?;
    non_negative("sampler.min_elapsed_ms", s.min_elapsed_ms.into())?;
    non_negative("sampler.min_path_mm", s.min_path_mm.into())?;

    non_negative("timing.connect_debounce_ms", p.timing.connect_debounce_ms)?;
    non_negative("timing.detect_delay_ms", p.timing.detect_delay_ms)?;

    let t = &p.thresholds;
    non_negative("thresholds.tap.max_radius_mm", t.tap.max_radius_mm.into())?;
    non_negative("thresholds.tap.max_duration_ms", t.tap.max_duration_ms)?;
    check(
        t.polytap.window_ms.is_finite() && t.polytap.window_ms > 0.0,
        || "thresholds.polytap.window_ms must be positive".to_string(),
    )?;
    for (name, sw) in [("swipe", &t.swipe), ("dualswipe", &t.dualswipe)] {
        non_negative(&format!("thresholds.{name}.min_radius_mm"), sw.min_radius_mm.into())?;
        non_negative(&format!("thresholds.{name}.min_speed"), sw.min_speed.into())?;
        if let Some(max) = sw.max_duration_ms {
            non_negative(&format!("thresholds.{name}.max_duration_ms"), max)?;
        }
    }
    for (name, h) in [("hold", &t.hold), ("dualhold", &t.dualhold)] {
        non_negative(&format!("thresholds.{name}.max_radius_mm"), h.max_radius_mm.into())?;
        non_negative(&format!("thresholds.{name}.min_duration_ms"), h.min_duration_ms)?;
    }
    for (name, pan) in [("pan", &t.pan), ("dualpan", &t.dualpan)] {
        non_negative(&format!("thresholds.{name}.min_radius_mm"), pan.min_radius_mm.into())?;
        non_negative(&format!("thresholds.{name}.max_speed"), pan.max_speed.into())?;
    }
    non_negative("thresholds.glide.min_path_mm", t.glide.min_path_mm.into())?;
    non_negative("thresholds.glide.min_path_speed", t.glide.min_path_speed.into())?;
    non_negative("thresholds.glide.max_turn_deviation", t.glide.max_turn_deviation.into())?;
    non_negative("thresholds.swirl.min_turn_deg", t.swirl.min_turn_deg.into())?;
    non_negative("thresholds.swirl.min_turn_deviation", t.swirl.min_turn_deviation.into())?;
    non_negative("thresholds.pinch.min_gap_diameter_mm", t.pinch.min_gap_diameter_mm.into())?;
    non_negative("thresholds.pinch.max_gap_angle_deg", t.pinch.max_gap_angle_deg.into())?;
    non_negative("thresholds.pinch.max_gap_speed", t.pinch.max_gap_speed.into())?;
    non_negative("thresholds.twist.min_pair_diameter_mm", t.twist.min_pair_diameter_mm.into())?;
    non_negative("thresholds.twist.max_gap_diameter_mm", t.twist.max_gap_diameter_mm.into())?;
    non_negative("thresholds.twist.min_gap_angle_deg", t.twist.min_gap_angle_deg.into())?;
    for (name, b) in [("explode", &t.explode), ("implode", &t.implode)] {
        non_negative(
            &format!("thresholds.{name}.min_gap_diameter_mm"),
            b.min_gap_diameter_mm.into(),
        )?;
        non_negative(&format!("thresholds.{name}.min_gap_speed"), b.min_gap_speed.into())?;
    }
    Ok(())
}
