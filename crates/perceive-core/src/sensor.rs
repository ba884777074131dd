use std::any::Any;
use std::fmt;
use std::rc::{Rc, Weak};

use uuid::Uuid;

use crate::awareness::Awareness;
use crate::cone::ViewCone;
use crate::constants::{COOLDOWN_PHASES, RANGE_MARGIN};
use crate::link::SenseLink;
use crate::registry::SensorHandle;
use crate::signal::{SenseKind, Signal};
use crate::strategy::{DistanceStrategy, HearingModel, LineOfSight};
use crate::vector::Vec3;

pub type DetectionCallback = Rc<dyn Fn(&SenseLink)>;

/// A sensing agent: a set of view cones plus the policies used to turn a
/// signal into a detection.
///
/// Position and forward are plain data written by the host every frame
/// before the manager evaluates. The sensor keeps the widest cone range
/// cached for a cheap distance reject; every cone mutation goes through a
/// method that refreshes it.
///
/// Clones share the id, callback and strategies of their source, so a clone
/// counts as the same sensor for registration.
#[derive(Clone)]
pub struct Sensor {
    id: Uuid,
    handle: SensorHandle,
    pub kind: SenseKind,
    cooldown_seconds: f64,
    cones: Vec<ViewCone>,
    pub position: Vec3,
    pub forward: Vec3,
    max_range: f32,
    distance: DistanceStrategy,
    line_of_sight: LineOfSight,
    hearing: HearingModel,
    on_detected: Option<DetectionCallback>,
    owner: Option<Weak<dyn Any>>,
}

impl Sensor {
    pub fn new(kind: SenseKind, cooldown_seconds: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            handle: SensorHandle::INVALID,
            kind,
            cooldown_seconds: sanitize_cooldown(cooldown_seconds),
            cones: Vec::new(),
            position: Vec3::ZERO,
            forward: Vec3::FORWARD,
            max_range: 0.0,
            distance: DistanceStrategy::Direct,
            line_of_sight: LineOfSight::NoCheck,
            hearing: HearingModel::Placeholder,
            on_detected: None,
            owner: None,
        }
    }

    pub fn vision(cooldown_seconds: f64) -> Self {
        Self::new(SenseKind::Vision, cooldown_seconds)
    }

    pub fn hearing(cooldown_seconds: f64) -> Self {
        Self::new(SenseKind::Hearing, cooldown_seconds)
    }

    // --- Builder ---

    pub fn with_cone(mut self, cone: ViewCone) -> Self {
        self.push_cone(cone);
        self
    }

    pub fn with_transform(mut self, position: Vec3, forward: Vec3) -> Self {
        self.set_transform(position, forward);
        self
    }

    pub fn with_distance(mut self, distance: DistanceStrategy) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_line_of_sight(mut self, line_of_sight: LineOfSight) -> Self {
        self.line_of_sight = line_of_sight;
        self
    }

    pub fn with_hearing(mut self, hearing: HearingModel) -> Self {
        self.hearing = hearing;
        self
    }

    /// Callback fired on a new detection or an escalation.
    pub fn on_detected(mut self, callback: impl Fn(&SenseLink) + 'static) -> Self {
        self.on_detected = Some(Rc::new(callback));
        self
    }

    /// Tie this sensor's lifetime to `owner`. Once every strong reference to
    /// the owner is gone, the manager drops the sensor at its next evaluation.
    pub fn bind_owner<T: Any>(&mut self, owner: &Rc<T>) {
        let weak: Weak<T> = Rc::downgrade(owner);
        self.owner = Some(weak);
    }

    // --- Accessors ---

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Registration handle, or `SensorHandle::INVALID` while unregistered.
    pub fn handle(&self) -> SensorHandle {
        self.handle
    }

    pub(crate) fn set_handle(&mut self, handle: SensorHandle) {
        self.handle = handle;
    }

    pub fn cooldown_seconds(&self) -> f64 {
        self.cooldown_seconds
    }

    pub fn set_cooldown_seconds(&mut self, seconds: f64) {
        self.cooldown_seconds = sanitize_cooldown(seconds);
    }

    /// Length of one decay step: a third of the cooldown, so a `High` belief
    /// reaches `None` after the full cooldown.
    pub fn cooldown_phase(&self) -> f64 {
        self.cooldown_seconds / COOLDOWN_PHASES
    }

    pub fn cones(&self) -> &[ViewCone] {
        &self.cones
    }

    /// Widest range over all cones.
    pub fn max_range(&self) -> f32 {
        self.max_range
    }

    pub fn line_of_sight(&self) -> &LineOfSight {
        &self.line_of_sight
    }

    pub fn set_line_of_sight(&mut self, line_of_sight: LineOfSight) {
        self.line_of_sight = line_of_sight;
    }

    pub fn set_distance(&mut self, distance: DistanceStrategy) {
        self.distance = distance;
    }

    pub fn set_transform(&mut self, position: Vec3, forward: Vec3) {
        self.position = position;
        self.forward = forward;
    }

    pub fn has_callback(&self) -> bool {
        self.on_detected.is_some()
    }

    /// False once a bound owner has been dropped. Unbound sensors live until
    /// unregistered.
    pub fn is_alive(&self) -> bool {
        self.owner
            .as_ref()
            .is_none_or(|owner| owner.strong_count() > 0)
    }

    pub(crate) fn notify(&self, link: &SenseLink) {
        if let Some(callback) = &self.on_detected {
            callback(link);
        }
    }

    // --- Cones ---

    pub fn push_cone(&mut self, cone: ViewCone) {
        self.cones.push(cone);
        self.recalculate_max_range();
    }

    /// Append a copy of the last cone, or a default cone when there is none.
    pub fn add_cone(&mut self) {
        let cone = self.cones.last().cloned().unwrap_or_default();
        self.push_cone(cone);
    }

    /// Remove the cone at `index`. Out-of-range indices are ignored.
    pub fn remove_cone(&mut self, index: usize) -> Option<ViewCone> {
        if index >= self.cones.len() {
            return None;
        }
        let cone = self.cones.remove(index);
        self.recalculate_max_range();
        Some(cone)
    }

    /// Replace the cone at `index`. Out-of-range indices are ignored.
    pub fn set_cone(&mut self, index: usize, cone: ViewCone) -> bool {
        let Some(slot) = self.cones.get_mut(index) else {
            return false;
        };
        *slot = cone;
        self.recalculate_max_range();
        true
    }

    pub fn clear_cones(&mut self) {
        self.cones.clear();
        self.max_range = 0.0;
    }

    fn recalculate_max_range(&mut self) {
        self.max_range = self.cones.iter().map(|c| c.range()).fold(0.0, f32::max);
    }

    // --- Evaluation ---

    /// Decide whether `signal` is detected right now.
    pub fn evaluate(&self, signal: &Signal, now: f64) -> Option<SenseLink> {
        match signal.kind {
            SenseKind::Vision => self.evaluate_vision(signal, now),
            SenseKind::Hearing => self.evaluate_hearing(signal, now),
        }
    }

    /// Strongest cone verdict for `signal`, ignoring line of sight.
    /// Ties keep the first cone found.
    pub fn cone_awareness(&self, signal: &Signal) -> Awareness {
        let mut max = Awareness::None;
        for cone in &self.cones {
            let a = cone.evaluate_signal(self.position, self.forward, signal);
            if a > max {
                max = a;
            }
        }
        max
    }

    fn evaluate_vision(&self, signal: &Signal, now: f64) -> Option<SenseLink> {
        let direction = self.distance.direction(self, signal);

        // Too far for any cone: skip the per-cone geometry
        if direction.length() > self.max_range + RANGE_MARGIN {
            return None;
        }

        let awareness = self.cone_awareness(signal);
        if !awareness.is_aware() {
            return None;
        }

        if !self.line_of_sight.is_visible(self, signal, direction) {
            return None;
        }

        Some(SenseLink::new(now, signal, awareness, true, SenseKind::Vision))
    }

    fn evaluate_hearing(&self, signal: &Signal, now: f64) -> Option<SenseLink> {
        let awareness = self.hearing.hear(self, signal)?;
        Some(SenseLink::new(now, signal, awareness, true, SenseKind::Hearing))
    }
}

fn sanitize_cooldown(seconds: f64) -> f64 {
    if seconds.is_finite() {
        seconds.max(0.0)
    } else {
        0.0
    }
}

impl fmt::Debug for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sensor")
            .field("id", &self.id)
            .field("handle", &self.handle)
            .field("kind", &self.kind)
            .field("cooldown_seconds", &self.cooldown_seconds)
            .field("cones", &self.cones)
            .field("position", &self.position)
            .field("forward", &self.forward)
            .field("max_range", &self.max_range)
            .field("distance", &self.distance)
            .field("line_of_sight", &self.line_of_sight)
            .field("hearing", &self.hearing)
            .field("has_callback", &self.on_detected.is_some())
            .finish()
    }
}
