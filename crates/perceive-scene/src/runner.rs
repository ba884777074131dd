//! Steps a [`Scenario`] through a [`SensorManager`].
//!
//! Each frame the runner ticks the manager at the current simulation time,
//! collects whatever the sensors' callbacks reported, then moves signals
//! (velocity plus seeded wander) and turns sensors for the next frame.

use std::cell::RefCell;
use std::rc::Rc;

use perceive_core::{
    Awareness, HearingModel, LineOfSight, SenseKind, SenseLink, Sensor, SensorHandle,
    SensorManager, Signal, SignalHandle, Vec3,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::error::{Result, SceneError};
use crate::scenario::{HearingConfig, LineOfSightConfig, Scenario, SensorConfig, SignalConfig};
use crate::world::{ColliderId, Sphere, SphereWorld};

/// A detection that fired a sensor's callback: new belief or escalation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetectionEvent {
    pub frame: u64,
    pub time: f64,
    pub sensor: String,
    pub signal: String,
    pub awareness: Awareness,
    pub first_hand: bool,
    pub kind: SenseKind,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BeliefSummary {
    pub signal: String,
    pub awareness: Awareness,
    pub first_hand: bool,
    pub last_sensed: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SensorSummary {
    pub sensor: String,
    pub alertness: Awareness,
    pub beliefs: Vec<BeliefSummary>,
}

struct SensorState {
    name: String,
    handle: SensorHandle,
    turn_rate: f32,
}

struct SignalState {
    name: String,
    handle: SignalHandle,
    collider: ColliderId,
    velocity: Vec3,
    wander: f32,
}

type DetectionLog = Rc<RefCell<Vec<(usize, SenseLink)>>>;

pub struct Runner {
    manager: SensorManager,
    world: Rc<SphereWorld>,
    sensors: Vec<SensorState>,
    signals: Vec<SignalState>,
    detections: DetectionLog,
    rng: SmallRng,
    frame: u64,
    time: f64,
}

impl Runner {
    /// Build the world and register every sensor and signal.
    pub fn new(scenario: &Scenario) -> Result<Self> {
        scenario.validate()?;

        let world = Rc::new(SphereWorld::new());
        for obstacle in &scenario.obstacles {
            world.add(Sphere::new(obstacle.center.into(), obstacle.radius));
        }

        let mut runner = Self {
            manager: SensorManager::new(scenario.manager.clone()),
            world,
            sensors: Vec::with_capacity(scenario.sensors.len()),
            signals: Vec::with_capacity(scenario.signals.len()),
            detections: Rc::default(),
            rng: SmallRng::seed_from_u64(scenario.run.seed),
            frame: 0,
            time: 0.0,
        };

        for config in &scenario.signals {
            runner.add_signal(config)?;
        }
        for config in &scenario.sensors {
            runner.add_sensor(config)?;
        }

        tracing::debug!(
            sensors = runner.sensors.len(),
            signals = runner.signals.len(),
            colliders = runner.world.len(),
            "scenario ready"
        );
        Ok(runner)
    }

    fn add_signal(&mut self, config: &SignalConfig) -> Result<()> {
        let position = Vec3::from(config.position);
        let signal = Signal::new(config.kind)
            .with_position(position)
            .with_intensity(config.intensity)
            .with_audio_range(config.audio_range)
            .with_attenuation(config.attenuated);
        let handle = self.manager.register_signal(signal);
        if !handle.is_valid() {
            return Err(SceneError::Invalid(format!(
                "signal '{}' was refused by the manager",
                config.name
            )));
        }
        let collider = self.world.add(Sphere::new(position, config.radius));
        self.signals.push(SignalState {
            name: config.name.clone(),
            handle,
            collider,
            velocity: config.velocity.into(),
            wander: config.wander,
        });
        Ok(())
    }

    fn add_sensor(&mut self, config: &SensorConfig) -> Result<()> {
        let index = self.sensors.len();
        let log = Rc::clone(&self.detections);

        let mut sensor = Sensor::new(config.kind, config.cooldown)
            .with_transform(config.position.into(), Vec3::from(config.forward).normalize())
            .with_line_of_sight(self.line_of_sight(config.line_of_sight))
            .with_hearing(self.hearing(config.hearing))
            .on_detected(move |link| log.borrow_mut().push((index, link.clone())));
        for cone in &config.cones {
            sensor.push_cone(cone.to_cone());
        }

        let handle = self.manager.register_sensor(sensor);
        if !handle.is_valid() {
            return Err(SceneError::Invalid(format!(
                "sensor '{}' was refused by the manager",
                config.name
            )));
        }
        self.sensors.push(SensorState {
            name: config.name.clone(),
            handle,
            turn_rate: config.turn_rate,
        });
        Ok(())
    }

    fn line_of_sight(&self, config: LineOfSightConfig) -> LineOfSight {
        match config {
            LineOfSightConfig::None => LineOfSight::NoCheck,
            LineOfSightConfig::Single => LineOfSight::SingleRaycast(self.world.clone()),
            LineOfSightConfig::Complete => LineOfSight::CompleteRaycast(self.world.clone()),
        }
    }

    fn hearing(&self, config: HearingConfig) -> HearingModel {
        match config {
            HearingConfig::Placeholder => HearingModel::Placeholder,
            HearingConfig::Radius => {
                let world = Rc::clone(&self.world);
                HearingModel::custom(move |sensor, signal| {
                    let in_range = sensor.position.distance(signal.position) <= signal.audio_range;
                    let muffled = signal.attenuated_by_obstacles
                        && world.is_blocked(sensor.position, signal.position);
                    (in_range && !muffled).then_some(Awareness::Low)
                })
            }
        }
    }

    /// Run one frame and return the detections it fired.
    pub fn step(&mut self, dt: f64) -> Vec<DetectionEvent> {
        if let Some(report) = self.manager.update(self.time) {
            tracing::trace!(
                frame = self.frame,
                decayed = report.decayed,
                pruned = report.pruned,
                fired = report.fired(),
                "frame"
            );
        }
        let events = self.drain_detections();
        self.advance(dt);
        self.frame += 1;
        events
    }

    /// Run `frames` frames of `dt` seconds each.
    pub fn run(&mut self, frames: u64, dt: f64) -> Vec<DetectionEvent> {
        let mut events = Vec::new();
        for _ in 0..frames {
            events.extend(self.step(dt));
        }
        events
    }

    fn drain_detections(&mut self) -> Vec<DetectionEvent> {
        let drained: Vec<(usize, SenseLink)> = self.detections.borrow_mut().drain(..).collect();
        drained
            .into_iter()
            .map(|(sensor, link)| DetectionEvent {
                frame: self.frame,
                time: link.time_last_sensed,
                sensor: self.sensors[sensor].name.clone(),
                signal: self.signal_name(link.signal),
                awareness: link.awareness,
                first_hand: link.first_hand,
                kind: link.kind,
            })
            .collect()
    }

    fn advance(&mut self, dt: f64) {
        let dt32 = dt as f32;

        for state in &self.signals {
            let mut delta = state.velocity * dt32;
            if state.wander > 0.0 {
                let jitter = Vec3::new(
                    self.rng.random_range(-1.0..=1.0),
                    0.0,
                    self.rng.random_range(-1.0..=1.0),
                );
                delta = delta + jitter * (state.wander * dt32);
            }
            if let Some(signal) = self.manager.signal_mut(state.handle) {
                let position = signal.position + delta;
                signal.set_position(position);
                self.world.move_to(state.collider, position);
            }
        }

        for state in &self.sensors {
            if state.turn_rate == 0.0 {
                continue;
            }
            if let Some(sensor) = self.manager.sensor_mut(state.handle) {
                let forward = sensor.forward.rotate_y(state.turn_rate * dt32);
                sensor.set_transform(sensor.position, forward);
            }
        }

        self.time += dt;
    }

    fn signal_name(&self, handle: SignalHandle) -> String {
        self.signals
            .iter()
            .find(|s| s.handle == handle)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| format!("signal#{handle}"))
    }

    /// Every sensor's current beliefs, in scenario order.
    pub fn summary(&self) -> Vec<SensorSummary> {
        self.sensors
            .iter()
            .map(|state| SensorSummary {
                sensor: state.name.clone(),
                alertness: self.manager.alertness(state.handle),
                beliefs: self
                    .manager
                    .memory(state.handle)
                    .iter()
                    .map(|link| BeliefSummary {
                        signal: self.signal_name(link.signal),
                        awareness: link.awareness,
                        first_hand: link.first_hand,
                        last_sensed: link.time_last_sensed,
                    })
                    .collect(),
            })
            .collect()
    }

    pub fn manager(&self) -> &SensorManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut SensorManager {
        &mut self.manager
    }

    pub fn world(&self) -> &SphereWorld {
        &self.world
    }

    pub fn sensor_handle(&self, name: &str) -> Option<SensorHandle> {
        self.sensors.iter().find(|s| s.name == name).map(|s| s.handle)
    }

    pub fn signal_handle(&self, name: &str) -> Option<SignalHandle> {
        self.signals.iter().find(|s| s.name == name).map(|s| s.handle)
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn time(&self) -> f64 {
        self.time
    }
}
