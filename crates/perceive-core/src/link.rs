use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::awareness::Awareness;
use crate::registry::SignalHandle;
use crate::signal::{SenseKind, Signal};

/// What makes two memory entries "the same belief": the signal's identity and
/// whether it was sensed first-hand. Awareness is deliberately absent so an
/// entry can be found and its level changed in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LinkKey {
    pub signal_id: Uuid,
    pub first_hand: bool,
}

/// One sensor's belief about one signal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SenseLink {
    pub signal: SignalHandle,
    pub signal_id: Uuid,
    pub awareness: Awareness,
    /// Simulation time, in seconds, of the last detection or decay step.
    pub time_last_sensed: f64,
    /// `false` when the belief was reported by someone else.
    pub first_hand: bool,
    pub kind: SenseKind,
}

impl SenseLink {
    pub fn new(time: f64, signal: &Signal, awareness: Awareness, first_hand: bool, kind: SenseKind) -> Self {
        Self {
            signal: signal.handle(),
            signal_id: signal.id(),
            awareness,
            time_last_sensed: time,
            first_hand,
            kind,
        }
    }

    pub fn key(&self) -> LinkKey {
        LinkKey {
            signal_id: self.signal_id,
            first_hand: self.first_hand,
        }
    }

    pub fn same_key(&self, other: &SenseLink) -> bool {
        self.key() == other.key()
    }

    /// Mark as sensed at `now` without changing awareness.
    pub fn touch(&mut self, now: f64) {
        self.time_last_sensed = now;
    }

    /// One cooldown step: awareness drops one level and the phase restarts.
    pub fn decay(&mut self, now: f64) {
        self.awareness = self.awareness.lowered();
        self.time_last_sensed = now;
    }

    /// Whether a full cooldown phase has elapsed since the last update.
    pub fn phase_elapsed(&self, phase: f64, now: f64) -> bool {
        self.time_last_sensed + phase <= now
    }
}
