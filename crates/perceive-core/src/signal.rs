use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::registry::SignalHandle;
use crate::vector::Vec3;

/// Sensing modality. Signals are emitted in one modality and sensors are
/// built for one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenseKind {
    #[default]
    Vision,
    Hearing,
}

impl SenseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vision => "vision",
            Self::Hearing => "hearing",
        }
    }
}

/// A point emitter that sensors may detect.
///
/// The owner refreshes `position` every frame. Identity is the id assigned at
/// construction: clones share it, two independently built signals never do.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Signal {
    id: Uuid,
    #[serde(skip)]
    handle: SignalHandle,
    pub kind: SenseKind,
    pub intensity: f32,
    pub position: Vec3,
    /// Audible radius of a sound. Unused by the placeholder hearing model.
    pub audio_range: f32,
    pub attenuated_by_obstacles: bool,
}

impl Signal {
    pub fn new(kind: SenseKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            handle: SignalHandle::INVALID,
            kind,
            intensity: 1.0,
            position: Vec3::ZERO,
            audio_range: 0.0,
            attenuated_by_obstacles: false,
        }
    }

    /// Visual signal at `position` with unit intensity.
    pub fn visual(position: Vec3) -> Self {
        Self::new(SenseKind::Vision).with_position(position)
    }

    /// Sound signal with an audible radius.
    pub fn audio(range: f32, attenuated_by_obstacles: bool) -> Self {
        Self {
            audio_range: range,
            attenuated_by_obstacles,
            ..Self::new(SenseKind::Hearing)
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Registration handle, or `SignalHandle::INVALID` while unregistered.
    pub fn handle(&self) -> SignalHandle {
        self.handle
    }

    pub(crate) fn set_handle(&mut self, handle: SignalHandle) {
        self.handle = handle;
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn with_audio_range(mut self, range: f32) -> Self {
        self.audio_range = range;
        self
    }

    pub fn with_attenuation(mut self, attenuated: bool) -> Self {
        self.attenuated_by_obstacles = attenuated;
        self
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Same emitter, regardless of where it currently is.
    pub fn is_same(&self, other: &Signal) -> bool {
        self.id == other.id
    }
}
