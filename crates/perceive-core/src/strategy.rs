//! Pluggable policies a sensor consults while evaluating a signal.
//!
//! The engine never intersects rays itself. Line-of-sight policies interpret
//! the answers of a [`SpatialQuery`] supplied by the host's physics layer.
//! Custom policies return a [`StrategyResult`]; a failure is logged and the
//! default policy answers for that one call.

use std::fmt;
use std::rc::Rc;

use crate::awareness::Awareness;
use crate::constants::HIT_EPSILON;
use crate::error::{StrategyError, StrategyResult};
use crate::sensor::Sensor;
use crate::signal::Signal;
use crate::vector::Vec3;

/// One ray intersection, as reported by the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// Position of the object that was hit (its origin, not the surface point).
    pub position: Vec3,
    /// Distance along the ray to the surface.
    pub distance: f32,
}

impl RayHit {
    /// Whether this hit is the object sitting at `target`.
    pub fn is_at(&self, target: Vec3) -> bool {
        self.position.approx_eq(target, HIT_EPSILON)
    }
}

/// Ray queries answered by the host's spatial/physics layer.
pub trait SpatialQuery {
    /// All hits along the ray, nearest first.
    fn raycast_all(&self, origin: Vec3, direction: Vec3) -> Vec<RayHit>;

    /// Nearest hit along the ray.
    fn raycast(&self, origin: Vec3, direction: Vec3) -> Option<RayHit> {
        self.raycast_all(origin, direction).into_iter().next()
    }
}

pub type DistanceFn = dyn Fn(&Sensor, &Signal) -> StrategyResult<Vec3>;
pub type LineOfSightFn = dyn Fn(&Sensor, &Signal, Vec3) -> StrategyResult<bool>;
pub type HearingFn = dyn Fn(&Sensor, &Signal) -> Option<Awareness>;

/// Straight subtraction: signal position minus sensor position.
pub fn direct_direction(sensor: &Sensor, signal: &Signal) -> Vec3 {
    signal.position - sensor.position
}

/// Produces the sensor→signal vector used for range gating and ray casts.
#[derive(Clone, Default)]
pub enum DistanceStrategy {
    #[default]
    Direct,
    Custom(Rc<DistanceFn>),
}

impl DistanceStrategy {
    pub fn custom(f: impl Fn(&Sensor, &Signal) -> StrategyResult<Vec3> + 'static) -> Self {
        Self::Custom(Rc::new(f))
    }

    /// Direction from `sensor` to `signal`. A failing or non-finite custom
    /// answer falls back to [`direct_direction`].
    pub fn direction(&self, sensor: &Sensor, signal: &Signal) -> Vec3 {
        let Self::Custom(f) = self else {
            return direct_direction(sensor, signal);
        };
        let result = f(sensor, signal).and_then(|v| {
            if v.is_finite() {
                Ok(v)
            } else {
                Err(StrategyError::InvalidVector(v))
            }
        });
        match result {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(
                    sensor = %sensor.handle(),
                    "custom distance strategy failed, using direct distance: {e}"
                );
                direct_direction(sensor, signal)
            }
        }
    }
}

impl fmt::Debug for DistanceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("Direct"),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// Confirms that a signal inside a cone is not obstructed.
#[derive(Clone, Default)]
pub enum LineOfSight {
    /// Always visible.
    #[default]
    NoCheck,
    /// Visible iff the nearest hit along the direction is the signal.
    SingleRaycast(Rc<dyn SpatialQuery>),
    /// Visible iff the signal is anywhere in the hit list. Tolerates
    /// overlapping colliders sitting at the signal.
    CompleteRaycast(Rc<dyn SpatialQuery>),
    Custom(Rc<LineOfSightFn>),
}

impl LineOfSight {
    pub fn custom(f: impl Fn(&Sensor, &Signal, Vec3) -> StrategyResult<bool> + 'static) -> Self {
        Self::Custom(Rc::new(f))
    }

    /// Whether `signal` can be seen from `sensor` along `direction`.
    /// A failing custom predicate counts as not visible.
    pub fn is_visible(&self, sensor: &Sensor, signal: &Signal, direction: Vec3) -> bool {
        match self {
            Self::NoCheck => true,
            Self::SingleRaycast(query) => query
                .raycast(sensor.position, direction)
                .is_some_and(|hit| hit.is_at(signal.position)),
            Self::CompleteRaycast(query) => query
                .raycast_all(sensor.position, direction)
                .iter()
                .any(|hit| hit.is_at(signal.position)),
            Self::Custom(f) => match f(sensor, signal, direction) {
                Ok(visible) => visible,
                Err(e) => {
                    tracing::warn!(
                        sensor = %sensor.handle(),
                        "custom line-of-sight check failed, treating as obstructed: {e}"
                    );
                    false
                }
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::NoCheck => "no-check",
            Self::SingleRaycast(_) => "single-raycast",
            Self::CompleteRaycast(_) => "complete-raycast",
            Self::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for LineOfSight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decides what a sensor makes of a sound.
#[derive(Clone, Default)]
pub enum HearingModel {
    /// Every sound is heard at `Low`.
    #[default]
    Placeholder,
    Custom(Rc<HearingFn>),
}

impl HearingModel {
    pub fn custom(f: impl Fn(&Sensor, &Signal) -> Option<Awareness> + 'static) -> Self {
        Self::Custom(Rc::new(f))
    }

    pub fn hear(&self, sensor: &Sensor, signal: &Signal) -> Option<Awareness> {
        match self {
            Self::Placeholder => Some(Awareness::Low),
            Self::Custom(f) => f(sensor, signal).filter(|a| a.is_aware()),
        }
    }
}

impl fmt::Debug for HearingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Placeholder => f.write_str("Placeholder"),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}
