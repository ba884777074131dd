use crate::awareness::Awareness;
use crate::constants::{
    ANGLE_EPSILON_DEGREES, MAX_CONE_RANGE, MAX_FOV_DEGREES, MAX_HORIZONTAL_OFFSET_DEGREES,
    MAX_RECOGNITION_DELAY_FRAMES,
};
use crate::signal::Signal;
use crate::vector::Vec3;

/// A directional field-of-view gate.
///
/// A cone passes a target that is closer than `range` and within half of
/// `fov_degrees` of the cone's axis. The axis is the sensor's forward turned
/// by `horizontal_offset_degrees` about the vertical. A passing target gets
/// the cone's fixed awareness; distance and angle do not scale it.
///
/// Setters clamp into the supported ranges: fov 0–180°, range 0–15 units,
/// offset 0–360°, recognition delay 0–60 frames.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewCone {
    fov_degrees: u16,
    range: f32,
    horizontal_offset_degrees: u16,
    recognition_delay_frames: u16,
    awareness: Awareness,
}

impl ViewCone {
    pub fn new(fov_degrees: u16, range: f32, awareness: Awareness) -> Self {
        let mut cone = Self {
            awareness,
            ..Self::default()
        };
        cone.set_fov_degrees(fov_degrees);
        cone.set_range(range);
        cone
    }

    pub fn with_horizontal_offset(mut self, degrees: u16) -> Self {
        self.set_horizontal_offset_degrees(degrees);
        self
    }

    pub fn with_recognition_delay(mut self, frames: u16) -> Self {
        self.set_recognition_delay_frames(frames);
        self
    }

    pub fn fov_degrees(&self) -> u16 {
        self.fov_degrees
    }

    pub fn range(&self) -> f32 {
        self.range
    }

    pub fn horizontal_offset_degrees(&self) -> u16 {
        self.horizontal_offset_degrees
    }

    /// Carried for hosts that gate recognition on dwell time; the gate itself
    /// does not consult it.
    pub fn recognition_delay_frames(&self) -> u16 {
        self.recognition_delay_frames
    }

    pub fn awareness(&self) -> Awareness {
        self.awareness
    }

    pub fn set_fov_degrees(&mut self, degrees: u16) {
        self.fov_degrees = degrees.min(MAX_FOV_DEGREES);
    }

    pub fn set_range(&mut self, range: f32) {
        self.range = if range.is_nan() {
            0.0
        } else {
            range.clamp(0.0, MAX_CONE_RANGE)
        };
    }

    pub fn set_horizontal_offset_degrees(&mut self, degrees: u16) {
        self.horizontal_offset_degrees = degrees.min(MAX_HORIZONTAL_OFFSET_DEGREES);
    }

    pub fn set_recognition_delay_frames(&mut self, frames: u16) {
        self.recognition_delay_frames = frames.min(MAX_RECOGNITION_DELAY_FRAMES);
    }

    pub fn set_awareness(&mut self, awareness: Awareness) {
        self.awareness = awareness;
    }

    /// The cone's axis for a sensor facing `forward`.
    pub fn axis(&self, forward: Vec3) -> Vec3 {
        if self.horizontal_offset_degrees > 0 {
            forward.rotate_y(self.horizontal_offset_degrees as f32)
        } else {
            forward
        }
    }

    /// Gate a point. Returns the cone's awareness on pass, `None` otherwise.
    pub fn evaluate_point(&self, cone_position: Vec3, cone_forward: Vec3, target: Vec3) -> Awareness {
        let to_target = target - cone_position;
        if to_target.length() >= self.range || self.fov_degrees == 0 {
            return Awareness::None;
        }

        let half_fov = self.fov_degrees as f32 / 2.0;
        let angle = self.axis(cone_forward).angle_degrees(to_target);
        if angle - half_fov < ANGLE_EPSILON_DEGREES {
            self.awareness
        } else {
            Awareness::None
        }
    }

    /// Gate a signal at its current position.
    pub fn evaluate_signal(&self, cone_position: Vec3, cone_forward: Vec3, signal: &Signal) -> Awareness {
        self.evaluate_point(cone_position, cone_forward, signal.position)
    }
}
