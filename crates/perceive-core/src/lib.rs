//! Agent perception engine.
//!
//! Decides, tick by tick, whether sensing agents detect emitters in a scene
//! and keeps a decaying memory of what each agent has sensed. Sensors gate
//! signals through view cones (range + field of view) and a pluggable
//! line-of-sight check; the manager throttles evaluation, decays old beliefs
//! and fires callbacks on new or stronger detections.
//!
//! Zero I/O. The host feeds transforms, simulation time and ray queries.

pub mod awareness;
pub mod cone;
pub mod constants;
pub mod error;
pub mod link;
pub mod manager;
pub mod registry;
pub mod sensor;
pub mod signal;
pub mod strategy;
pub mod vector;

pub use awareness::Awareness;
pub use cone::ViewCone;
pub use constants::{COOLDOWN_PHASES, MAX_CONE_RANGE, MAX_FOV_DEGREES, RANGE_MARGIN};
pub use error::{StrategyError, StrategyResult};
pub use link::{LinkKey, SenseLink};
pub use manager::{ManagerConfig, MemoryUpdate, SensorManager, TickReport};
pub use registry::{Registry, SensorHandle, SignalHandle};
pub use sensor::{DetectionCallback, Sensor};
pub use signal::{SenseKind, Signal};
pub use strategy::{
    DistanceStrategy, HearingModel, LineOfSight, RayHit, SpatialQuery, direct_direction,
};
pub use vector::Vec3;
