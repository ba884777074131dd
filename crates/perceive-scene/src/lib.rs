//! Scenario files and a reference spatial world for `perceive-core`.

pub mod error;
pub mod runner;
pub mod scenario;
pub mod world;

pub use error::{Result, SceneError};
pub use runner::{BeliefSummary, DetectionEvent, Runner, SensorSummary};
pub use scenario::{
    ConeConfig, HearingConfig, LineOfSightConfig, ObstacleConfig, RunSettings, Scenario,
    SensorConfig, SignalConfig,
};
pub use world::{ColliderId, Sphere, SphereWorld};
