//!
//! Chassis Constants and Configuration
//!
//! Everything the chassis needs at construction time lives in a single
//! [`ChassisConfig`].  Configurations are validated when the chassis is built so
//! an invalid dimension or limit never reaches the control loops.
//!

use motion::{Gearset, PidGains};

use crate::{
    errors::positive, ConfigError, ControllerRole, LOOP_PERIOD_MS, SETTLE_ITERATIONS,
    SETTLE_TIMEOUT_MS, TURN_TIMEOUT_MS,
};

/// Distance between the left and right wheels (m)
pub const TRACK_WIDTH: f32 = 0.3;
/// Diameter of the drive wheels (m)
pub const WHEEL_DIAMETER: f32 = 0.08;
/// Maximum chassis velocity (m/s)
pub const MAX_VELOCITY: f32 = 1.0;
/// Maximum chassis acceleration (m/s^2)
pub const MAX_ACCELERATION: f32 = 2.0;
/// Distance within which a drive counts as reached (m)
pub const DISTANCE_TOLERANCE: f32 = 0.01;
/// Heading error within which a turn counts as reached (degrees)
pub const ANGLE_TOLERANCE: f32 = 1.0;

/// Default distance controller gains (V/m)
pub const DISTANCE_GAINS: PidGains = PidGains::new(20.0, 0.0, 0.0, 12.0);
/// Default heading hold gains (V/degree)
pub const ANGLE_GAINS: PidGains = PidGains::new(0.2, 0.0, 0.0, 4.0);
/// Default point turn gains (V/degree)
pub const TURN_GAINS: PidGains = PidGains::new(0.5, 0.0, 0.0, 12.0);

/// Chassis dimensions
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dimensions {
    /// Distance between the left and right wheel contact lines (m)
    pub track_width: f32,
    /// Drive wheel diameter (m)
    pub wheel_diameter: f32,
}

impl Dimensions {
    /// Drive wheel radius (m)
    pub fn wheel_radius(&self) -> f32 {
        self.wheel_diameter / 2.0
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            track_width: TRACK_WIDTH,
            wheel_diameter: WHEEL_DIAMETER,
        }
    }
}

/// Chassis velocity and acceleration limits
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Limits {
    /// Maximum velocity (m/s)
    pub max_velocity: f32,
    /// Maximum acceleration (m/s^2)
    pub max_acceleration: f32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_velocity: MAX_VELOCITY,
            max_acceleration: MAX_ACCELERATION,
        }
    }
}

/// Feedforward terms applied to the motion profile's targets
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeedforwardGains {
    /// Volts per m/s of target velocity
    pub kv: f32,
    /// Volts per m/s^2 of target acceleration
    pub ka: f32,
}

impl FeedforwardGains {
    /// Feedforward voltage for a target velocity and acceleration
    pub fn voltage(&self, velocity: f32, acceleration: f32) -> f32 {
        self.kv * velocity + self.ka * acceleration
    }
}

impl Default for FeedforwardGains {
    fn default() -> Self {
        Self { kv: 12.0, ka: 0.5 }
    }
}

/// One gain set per controller role
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControllerGains {
    /// Distance controller
    pub distance: PidGains,
    /// Heading hold controller
    pub angle: PidGains,
    /// Point turn controller
    pub turn: PidGains,
}

impl Default for ControllerGains {
    fn default() -> Self {
        Self {
            distance: DISTANCE_GAINS,
            angle: ANGLE_GAINS,
            turn: TURN_GAINS,
        }
    }
}

/// Settling and timeout bounds shared by the motion primitives
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerances {
    /// Distance within which a drive counts as reached (m)
    pub distance: f32,
    /// Heading error within which a turn counts as reached (degrees)
    pub angle: f32,
    /// Consecutive in-tolerance iterations before a turn is settled
    pub settle_iterations: u32,
    /// Time a drive may spend settling after its profile finishes (ms)
    pub settle_timeout_ms: u32,
    /// Time a point turn may take (ms)
    pub turn_timeout_ms: u32,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            distance: DISTANCE_TOLERANCE,
            angle: ANGLE_TOLERANCE,
            settle_iterations: SETTLE_ITERATIONS,
            settle_timeout_ms: SETTLE_TIMEOUT_MS,
            turn_timeout_ms: TURN_TIMEOUT_MS,
        }
    }
}

/// Everything needed to construct a [`Chassis`](crate::Chassis)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChassisConfig {
    /// Cartridge installed in the drive motors
    pub gearset: Gearset,
    /// Wheel rotations per motor output shaft rotation
    pub gear_ratio: f32,
    /// Chassis dimensions
    pub dimensions: Dimensions,
    /// Chassis limits
    pub limits: Limits,
    /// Feedback controller gains
    pub gains: ControllerGains,
    /// Feedforward gains
    pub feedforward: FeedforwardGains,
    /// Settling and timeout bounds
    pub tolerances: Tolerances,
    /// Period of the control loop (ms)
    pub loop_period_ms: u32,
}

impl Default for ChassisConfig {
    fn default() -> Self {
        Self {
            gearset: Gearset::Green,
            gear_ratio: 1.0,
            dimensions: Dimensions::default(),
            limits: Limits::default(),
            gains: ControllerGains::default(),
            feedforward: FeedforwardGains::default(),
            tolerances: Tolerances::default(),
            loop_period_ms: LOOP_PERIOD_MS,
        }
    }
}

impl ChassisConfig {
    /// Reject configurations that would divide by zero or run away later
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive(self.dimensions.track_width, ConfigError::TrackWidth)?;
        positive(self.dimensions.wheel_diameter, ConfigError::WheelDiameter)?;
        positive(self.limits.max_velocity, ConfigError::MaxVelocity)?;
        positive(self.limits.max_acceleration, ConfigError::MaxAcceleration)?;
        positive(self.gear_ratio, ConfigError::GearRatio)?;
        positive(self.tolerances.distance, ConfigError::Tolerance)?;
        positive(self.tolerances.angle, ConfigError::Tolerance)?;

        let roles = [
            (ControllerRole::Distance, self.gains.distance),
            (ControllerRole::Angle, self.gains.angle),
            (ControllerRole::Turn, self.gains.turn),
        ];
        for (role, gains) in roles {
            if !(gains.max_output >= 0.0) {
                return Err(ConfigError::GainClamp(role, gains.max_output));
            }
        }

        if self.loop_period_ms == 0 {
            return Err(ConfigError::LoopPeriod);
        }

        Ok(())
    }
}
