/// Safety margin added to a sensor's widest cone range before the cheap
/// distance reject in the vision path.
pub const RANGE_MARGIN: f32 = 1.0;

/// Number of decay steps between `High` and `None`. A sensor's cooldown is
/// split into this many equal phases.
pub const COOLDOWN_PHASES: f64 = 3.0;

/// Widest field of view a cone may have, in degrees.
pub const MAX_FOV_DEGREES: u16 = 180;

/// Longest reach a cone may have, in world units.
pub const MAX_CONE_RANGE: f32 = 15.0;

/// Largest horizontal offset of a cone from the sensor's forward, in degrees.
pub const MAX_HORIZONTAL_OFFSET_DEGREES: u16 = 360;

/// Longest recognition delay a cone may carry, in frames.
pub const MAX_RECOGNITION_DELAY_FRAMES: u16 = 60;

/// Angular slack when comparing against a cone's half-angle, in degrees.
/// Absorbs float noise so a target exactly on the cone edge is inside.
pub const ANGLE_EPSILON_DEGREES: f32 = 1e-3;

/// Per-axis tolerance for matching a ray hit to the signal's position.
pub const HIT_EPSILON: f32 = 1e-4;

/// Numerical epsilon for near-zero vector lengths.
pub const EPSILON: f32 = 1e-6;
