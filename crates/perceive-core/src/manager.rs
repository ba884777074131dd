//! The perception scheduler.
//!
//! Owns every registered sensor and signal plus each sensor's memory of what
//! it has sensed. The host calls [`SensorManager::tick`] once per frame; every
//! `frame_delay` calls the manager runs one live tick:
//!
//! 1. **Cooldown pass**: each belief whose cooldown phase has elapsed drops
//!    one awareness level. Runs first so this tick's fresh detections are not
//!    decayed by the same tick.
//! 2. **Evaluation pass**: every (sensor, signal) pair is evaluated and the
//!    result merged into memory. A new belief or an escalation fires the
//!    sensor's callback; an equal or weaker detection only refreshes the
//!    belief's timestamp.
//!
//! Both passes are public so a host can interleave registry changes between
//! them. The evaluation pass works from a snapshot of handles and skips any
//! entry removed since.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::awareness::Awareness;
use crate::link::SenseLink;
use crate::registry::{Registry, SensorHandle, SignalHandle};
use crate::sensor::Sensor;
use crate::signal::Signal;

/// Manager settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Frames between live ticks for [`SensorManager::update`]. 0 and 1 both
    /// mean every frame.
    pub frame_delay: u32,
    /// Remove beliefs that were already at `None` when a cooldown pass starts.
    pub prune_stale: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            frame_delay: 1,
            prune_stale: true,
        }
    }
}

/// Outcome of merging one detection into a sensor's memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemoryUpdate {
    /// No prior belief about this signal; callback fired.
    New,
    /// Stored awareness was strictly lower; replaced and callback fired.
    Escalated,
    /// Stored awareness was equal or higher; timestamp refreshed silently.
    Refreshed,
}

impl MemoryUpdate {
    pub fn fires_callback(self) -> bool {
        matches!(self, Self::New | Self::Escalated)
    }
}

/// Counters for one live tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub decayed: usize,
    pub pruned: usize,
    pub evaluated: usize,
    pub new: usize,
    pub escalated: usize,
    pub refreshed: usize,
    pub dropped_sensors: usize,
}

impl TickReport {
    pub fn fired(&self) -> usize {
        self.new + self.escalated
    }
}

pub struct SensorManager {
    config: ManagerConfig,
    sensors: Registry<Sensor>,
    signals: Registry<Signal>,
    memory: BTreeMap<SensorHandle, Vec<SenseLink>>,
    frames_since_last: u32,
    live_ticks: u64,
}

impl Default for SensorManager {
    fn default() -> Self {
        Self::new(ManagerConfig::default())
    }
}

impl SensorManager {
    pub fn new(config: ManagerConfig) -> Self {
        Self {
            config,
            sensors: Registry::new(),
            signals: Registry::new(),
            memory: BTreeMap::new(),
            frames_since_last: 0,
            live_ticks: 0,
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    // --- Registration ---

    /// Register a sensor and give it an empty memory. Returns
    /// `SensorHandle::INVALID` if a sensor with the same id is already
    /// registered.
    pub fn register_sensor(&mut self, mut sensor: Sensor) -> SensorHandle {
        if self.sensors.values().any(|s| s.id() == sensor.id()) {
            tracing::debug!(sensor_id = %sensor.id(), "sensor already registered");
            return SensorHandle::INVALID;
        }
        sensor.set_handle(SensorHandle::INVALID);
        let key = self.sensors.insert(sensor);
        let handle = SensorHandle(key);
        if let Some(s) = self.sensors.get_mut(key) {
            s.set_handle(handle);
        }
        self.memory.insert(handle, Vec::new());
        tracing::debug!(%handle, "registered sensor");
        handle
    }

    /// Remove a sensor together with its memory. Unknown handles are a no-op.
    pub fn unregister_sensor(&mut self, handle: SensorHandle) -> Option<Sensor> {
        let mut sensor = self.sensors.remove(handle.0)?;
        self.memory.remove(&handle);
        sensor.set_handle(SensorHandle::INVALID);
        tracing::debug!(%handle, "unregistered sensor");
        Some(sensor)
    }

    /// Register a signal. Returns `SignalHandle::INVALID` if a signal with the
    /// same id is already registered.
    pub fn register_signal(&mut self, mut signal: Signal) -> SignalHandle {
        if self.signals.values().any(|s| s.is_same(&signal)) {
            tracing::debug!(signal_id = %signal.id(), "signal already registered");
            return SignalHandle::INVALID;
        }
        signal.set_handle(SignalHandle::INVALID);
        let key = self.signals.insert(signal);
        let handle = SignalHandle(key);
        if let Some(s) = self.signals.get_mut(key) {
            s.set_handle(handle);
        }
        tracing::debug!(%handle, "registered signal");
        handle
    }

    /// Remove a signal. Beliefs about it stay in memory and decay normally.
    /// Unknown handles are a no-op.
    pub fn unregister_signal(&mut self, handle: SignalHandle) -> Option<Signal> {
        let mut signal = self.signals.remove(handle.0)?;
        signal.set_handle(SignalHandle::INVALID);
        tracing::debug!(%handle, "unregistered signal");
        Some(signal)
    }

    // --- Access ---

    pub fn sensor(&self, handle: SensorHandle) -> Option<&Sensor> {
        self.sensors.get(handle.0)
    }

    /// Mutable access for the host's per-frame transform feed.
    pub fn sensor_mut(&mut self, handle: SensorHandle) -> Option<&mut Sensor> {
        self.sensors.get_mut(handle.0)
    }

    pub fn signal(&self, handle: SignalHandle) -> Option<&Signal> {
        self.signals.get(handle.0)
    }

    /// Mutable access for the emitter's per-frame position feed.
    pub fn signal_mut(&mut self, handle: SignalHandle) -> Option<&mut Signal> {
        self.signals.get_mut(handle.0)
    }

    pub fn sensor_handles(&self) -> Vec<SensorHandle> {
        self.sensors.keys().into_iter().map(SensorHandle).collect()
    }

    pub fn signal_handles(&self) -> Vec<SignalHandle> {
        self.signals.keys().into_iter().map(SignalHandle).collect()
    }

    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    /// A sensor's current beliefs. Empty for unknown handles.
    pub fn memory(&self, handle: SensorHandle) -> &[SenseLink] {
        self.memory.get(&handle).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Belief of a sensor about a signal, first-hand or reported.
    pub fn link(&self, sensor: SensorHandle, signal: SignalHandle, first_hand: bool) -> Option<&SenseLink> {
        self.memory(sensor)
            .iter()
            .find(|l| l.signal == signal && l.first_hand == first_hand)
    }

    /// Overall alertness of a sensor: its strongest current belief.
    pub fn alertness(&self, handle: SensorHandle) -> Awareness {
        self.memory(handle)
            .iter()
            .map(|l| l.awareness)
            .max()
            .unwrap_or_default()
    }

    /// Number of live ticks run so far.
    pub fn live_ticks(&self) -> u64 {
        self.live_ticks
    }

    // --- Tick ---

    /// Advance one frame. Every `frame_delay` calls a live tick runs both
    /// passes at simulation time `now` and its report is returned.
    pub fn tick(&mut self, frame_delay: u32, now: f64) -> Option<TickReport> {
        self.frames_since_last += 1;
        if self.frames_since_last < frame_delay {
            return None;
        }
        self.frames_since_last = 0;
        self.live_ticks += 1;

        let mut report = self.cooldown_pass(now);
        let eval = self.evaluation_pass(now);
        report.evaluated = eval.evaluated;
        report.new = eval.new;
        report.escalated = eval.escalated;
        report.refreshed = eval.refreshed;
        report.dropped_sensors = eval.dropped_sensors;

        tracing::trace!(
            tick = self.live_ticks,
            now,
            decayed = report.decayed,
            fired = report.fired(),
            "live tick"
        );
        Some(report)
    }

    /// [`tick`](Self::tick) with the configured frame delay.
    pub fn update(&mut self, now: f64) -> Option<TickReport> {
        self.tick(self.config.frame_delay, now)
    }

    /// Decay every belief whose cooldown phase has elapsed by `now`. Links
    /// already at `None` are left untouched.
    pub fn cooldown_pass(&mut self, now: f64) -> TickReport {
        let mut report = TickReport::default();

        for (handle, links) in self.memory.iter_mut() {
            if links.is_empty() {
                continue;
            }
            let Some(sensor) = self.sensors.get(handle.0) else {
                continue;
            };
            let phase = sensor.cooldown_phase();

            if self.config.prune_stale {
                let before = links.len();
                links.retain(|l| l.awareness.is_aware());
                report.pruned += before - links.len();
            }

            for link in links.iter_mut().filter(|l| l.awareness.is_aware()) {
                if link.phase_elapsed(phase, now) {
                    link.decay(now);
                    report.decayed += 1;
                }
            }
        }

        report
    }

    /// Evaluate every (sensor, signal) pair at `now`, merging detections
    /// into memory and firing callbacks.
    pub fn evaluation_pass(&mut self, now: f64) -> TickReport {
        let mut report = TickReport::default();
        let sensor_handles = self.sensor_handles();

        for signal in self.signal_handles() {
            for &sensor in &sensor_handles {
                self.evaluate_pair(sensor, signal, now, &mut report);
            }
        }

        report
    }

    fn evaluate_pair(
        &mut self,
        sensor_handle: SensorHandle,
        signal_handle: SignalHandle,
        now: f64,
        report: &mut TickReport,
    ) {
        // Either side may have been unregistered since the snapshot
        let Some(sensor) = self.sensors.get(sensor_handle.0) else {
            return;
        };
        if !sensor.is_alive() {
            self.sensors.remove(sensor_handle.0);
            self.memory.remove(&sensor_handle);
            report.dropped_sensors += 1;
            tracing::debug!(handle = %sensor_handle, "dropped sensor whose owner is gone");
            return;
        }
        // Nobody is listening: evaluating would be wasted work
        if !sensor.has_callback() {
            return;
        }
        let Some(signal) = self.signals.get(signal_handle.0) else {
            return;
        };

        report.evaluated += 1;
        let Some(link) = sensor.evaluate(signal, now) else {
            return;
        };

        match self.merge(sensor_handle, link) {
            MemoryUpdate::New => report.new += 1,
            MemoryUpdate::Escalated => report.escalated += 1,
            MemoryUpdate::Refreshed => report.refreshed += 1,
        }
    }

    /// Fold a detection into a sensor's memory and fire its callback when the
    /// belief is new or stronger than before.
    fn merge(&mut self, sensor_handle: SensorHandle, link: SenseLink) -> MemoryUpdate {
        let links = self.memory.entry(sensor_handle).or_default();

        let update = match links.iter_mut().find(|l| l.same_key(&link)) {
            None => {
                links.push(link.clone());
                MemoryUpdate::New
            }
            Some(existing) if existing.awareness < link.awareness => {
                *existing = link.clone();
                MemoryUpdate::Escalated
            }
            Some(existing) => {
                // Weaker or equal: decay belongs to the cooldown pass
                existing.touch(link.time_last_sensed);
                MemoryUpdate::Refreshed
            }
        };

        if update.fires_callback()
            && let Some(sensor) = self.sensors.get(sensor_handle.0)
        {
            sensor.notify(&link);
        }
        update
    }

    /// Record a second-hand belief, e.g. an ally calling out a target. Goes
    /// through the same merge rules as a detection. Returns `None` when either
    /// handle is unknown or `awareness` is `None`.
    pub fn inform(
        &mut self,
        sensor: SensorHandle,
        signal: SignalHandle,
        awareness: Awareness,
        now: f64,
    ) -> Option<MemoryUpdate> {
        if !awareness.is_aware() || !self.sensors.contains(sensor.0) {
            return None;
        }
        let signal = self.signals.get(signal.0)?;
        let link = SenseLink::new(now, signal, awareness, false, signal.kind);
        Some(self.merge(sensor, link))
    }

    /// Drop all sensors, signals and memory and reset the frame counter.
    /// Handles issued before shutdown are never reissued.
    pub fn shutdown(&mut self) {
        let sensors = self.sensors.len();
        let signals = self.signals.len();
        self.sensors.clear();
        self.signals.clear();
        self.memory.clear();
        self.frames_since_last = 0;
        tracing::debug!(sensors, signals, "sensor manager shut down");
    }
}
