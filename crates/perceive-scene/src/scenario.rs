//! TOML scenario files.
//!
//! ```toml
//! [manager]
//! frame_delay = 1
//!
//! [run]
//! frames = 120
//! dt = 0.05
//! seed = 7
//!
//! [[sensors]]
//! name = "guard"
//! position = [0.0, 0.0, 0.0]
//! forward = [0.0, 0.0, 1.0]
//! cooldown = 3.0
//! line_of_sight = "single"
//!
//! [[sensors.cones]]
//! fov = 90
//! range = 10.0
//! awareness = "medium"
//!
//! [[signals]]
//! name = "intruder"
//! position = [0.0, 0.0, 20.0]
//! velocity = [0.0, 0.0, -2.0]
//!
//! [[obstacles]]
//! center = [0.0, 0.0, 5.0]
//! radius = 1.0
//! ```

use std::collections::HashSet;
use std::path::Path;

use perceive_core::constants::{
    MAX_CONE_RANGE, MAX_FOV_DEGREES, MAX_HORIZONTAL_OFFSET_DEGREES, MAX_RECOGNITION_DELAY_FRAMES,
};
use perceive_core::{Awareness, ManagerConfig, SenseKind, Vec3, ViewCone};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SceneError};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub manager: ManagerConfig,
    #[serde(default)]
    pub run: RunSettings,
    #[serde(default)]
    pub sensors: Vec<SensorConfig>,
    #[serde(default)]
    pub signals: Vec<SignalConfig>,
    #[serde(default)]
    pub obstacles: Vec<ObstacleConfig>,
}

/// Defaults for a run; the CLI may override frames and dt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSettings {
    pub frames: u64,
    /// Seconds of simulation time per frame.
    pub dt: f64,
    /// Seed for signal wander.
    pub seed: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            frames: 100,
            dt: 0.1,
            seed: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineOfSightConfig {
    #[default]
    None,
    Single,
    Complete,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HearingConfig {
    /// Every sound is heard at `low`.
    #[default]
    Placeholder,
    /// Heard at `low` within the sound's audio range; attenuated sounds are
    /// also blocked by any obstacle in between.
    Radius,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensorConfig {
    pub name: String,
    #[serde(default)]
    pub kind: SenseKind,
    #[serde(default = "default_cooldown")]
    pub cooldown: f64,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default = "default_forward")]
    pub forward: [f32; 3],
    /// Yaw rotation in degrees per second, positive towards +X.
    #[serde(default)]
    pub turn_rate: f32,
    #[serde(default)]
    pub line_of_sight: LineOfSightConfig,
    #[serde(default)]
    pub hearing: HearingConfig,
    #[serde(default)]
    pub cones: Vec<ConeConfig>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConeConfig {
    pub fov: u16,
    pub range: f32,
    pub awareness: Awareness,
    #[serde(default)]
    pub offset: u16,
    #[serde(default)]
    pub recognition_delay: u16,
}

impl ConeConfig {
    pub fn to_cone(&self) -> ViewCone {
        ViewCone::new(self.fov, self.range, self.awareness)
            .with_horizontal_offset(self.offset)
            .with_recognition_delay(self.recognition_delay)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignalConfig {
    pub name: String,
    #[serde(default)]
    pub kind: SenseKind,
    #[serde(default)]
    pub position: [f32; 3],
    /// Units per second.
    #[serde(default)]
    pub velocity: [f32; 3],
    /// Maximum random drift per second on the XZ plane.
    #[serde(default)]
    pub wander: f32,
    /// Collider radius used by ray casts.
    #[serde(default = "default_signal_radius")]
    pub radius: f32,
    #[serde(default = "default_intensity")]
    pub intensity: f32,
    #[serde(default)]
    pub audio_range: f32,
    #[serde(default)]
    pub attenuated: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObstacleConfig {
    pub center: [f32; 3],
    pub radius: f32,
}

fn default_cooldown() -> f64 {
    3.0
}

fn default_forward() -> [f32; 3] {
    [0.0, 0.0, 1.0]
}

fn default_signal_radius() -> f32 {
    0.5
}

fn default_intensity() -> f32 {
    1.0
}

impl Scenario {
    /// Parse and validate scenario text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Read, parse and validate a scenario file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let scenario = Self::from_toml(&text)?;
        tracing::debug!(
            path = %path.display(),
            sensors = scenario.sensors.len(),
            signals = scenario.signals.len(),
            obstacles = scenario.obstacles.len(),
            "loaded scenario"
        );
        Ok(scenario)
    }

    /// Reject values the engine would otherwise silently clamp.
    pub fn validate(&self) -> Result<()> {
        if !(self.run.dt.is_finite() && self.run.dt > 0.0) {
            return invalid(format!("run.dt must be positive, got {}", self.run.dt));
        }

        let mut names = HashSet::new();
        for sensor in &self.sensors {
            if !names.insert(sensor.name.as_str()) {
                return invalid(format!("duplicate sensor name '{}'", sensor.name));
            }
            validate_sensor(sensor)?;
        }

        names.clear();
        for signal in &self.signals {
            if !names.insert(signal.name.as_str()) {
                return invalid(format!("duplicate signal name '{}'", signal.name));
            }
            validate_signal(signal)?;
        }

        for (i, obstacle) in self.obstacles.iter().enumerate() {
            if !finite3(obstacle.center) {
                return invalid(format!("obstacle {i}: center must be finite"));
            }
            if !(obstacle.radius.is_finite() && obstacle.radius > 0.0) {
                return invalid(format!("obstacle {i}: radius must be positive"));
            }
        }
        Ok(())
    }
}

fn validate_sensor(sensor: &SensorConfig) -> Result<()> {
    let name = &sensor.name;
    if !(sensor.cooldown.is_finite() && sensor.cooldown >= 0.0) {
        return invalid(format!("sensor '{name}': cooldown must be >= 0"));
    }
    if !finite3(sensor.position) || !finite3(sensor.forward) || !sensor.turn_rate.is_finite() {
        return invalid(format!("sensor '{name}': transform must be finite"));
    }
    if Vec3::from(sensor.forward).length() == 0.0 {
        return invalid(format!("sensor '{name}': forward must be non-zero"));
    }
    if sensor.kind == SenseKind::Vision && sensor.cones.is_empty() {
        tracing::warn!(sensor = %name, "vision sensor has no cones and will see nothing");
    }

    for (i, cone) in sensor.cones.iter().enumerate() {
        if cone.fov > MAX_FOV_DEGREES {
            return invalid(format!(
                "sensor '{name}' cone {i}: fov {} exceeds {MAX_FOV_DEGREES}",
                cone.fov
            ));
        }
        if !(cone.range.is_finite() && (0.0..=MAX_CONE_RANGE).contains(&cone.range)) {
            return invalid(format!(
                "sensor '{name}' cone {i}: range {} outside 0..={MAX_CONE_RANGE}",
                cone.range
            ));
        }
        if cone.offset > MAX_HORIZONTAL_OFFSET_DEGREES {
            return invalid(format!(
                "sensor '{name}' cone {i}: offset {} exceeds {MAX_HORIZONTAL_OFFSET_DEGREES}",
                cone.offset
            ));
        }
        if cone.recognition_delay > MAX_RECOGNITION_DELAY_FRAMES {
            return invalid(format!(
                "sensor '{name}' cone {i}: recognition_delay {} exceeds {MAX_RECOGNITION_DELAY_FRAMES}",
                cone.recognition_delay
            ));
        }
        if !cone.awareness.is_aware() {
            return invalid(format!("sensor '{name}' cone {i}: awareness must not be none"));
        }
    }
    Ok(())
}

fn validate_signal(signal: &SignalConfig) -> Result<()> {
    let name = &signal.name;
    if !finite3(signal.position) || !finite3(signal.velocity) {
        return invalid(format!("signal '{name}': position and velocity must be finite"));
    }
    if !(signal.wander.is_finite() && signal.wander >= 0.0) {
        return invalid(format!("signal '{name}': wander must be >= 0"));
    }
    if !(signal.radius.is_finite() && signal.radius > 0.0) {
        return invalid(format!("signal '{name}': radius must be positive"));
    }
    if !(signal.audio_range.is_finite() && signal.audio_range >= 0.0) {
        return invalid(format!("signal '{name}': audio_range must be >= 0"));
    }
    Ok(())
}

fn finite3(v: [f32; 3]) -> bool {
    v.iter().all(|c| c.is_finite())
}

fn invalid<T>(msg: String) -> Result<T> {
    Err(SceneError::Invalid(msg))
}
