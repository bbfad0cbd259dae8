//!
//! Definitions of the errors that can occur while configuring the chassis.
//!
//! Runtime failures (a motion that does not settle in time) are not errors,
//! they are reported through [`MotionOutcome`](crate::MotionOutcome).
//!

use core::fmt;

/// The controller a gain set belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControllerRole {
    /// Distance controller used while driving straight and along arcs
    Distance,
    /// Heading hold controller used while driving straight
    Angle,
    /// Point turn controller
    Turn,
}

/// Error for constructing the chassis or its tracking
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConfigError {
    /// The track width must be positive (m)
    TrackWidth(f32),
    /// The wheel diameter must be positive (m)
    WheelDiameter(f32),
    /// The maximum velocity must be positive (m/s)
    MaxVelocity(f32),
    /// The maximum acceleration must be positive (m/s^2)
    MaxAcceleration(f32),
    /// The external gear ratio must be positive
    GearRatio(f32),
    /// Encoders must report a positive number of ticks per revolution
    TicksPerRevolution(f32),
    /// The output clamp of a controller must not be negative
    GainClamp(ControllerRole, f32),
    /// Settling tolerances must be positive
    Tolerance(f32),
    /// The control loop period must be at least 1ms
    LoopPeriod,
    /// The tracking wheel offsets must be non-negative with a positive
    /// left + right span
    WheelDistances,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrackWidth(value) => write!(f, "track width must be positive (got {})", value),
            Self::WheelDiameter(value) => write!(f, "wheel diameter must be positive (got {})", value),
            Self::MaxVelocity(value) => write!(f, "maximum velocity must be positive (got {})", value),
            Self::MaxAcceleration(value) => {
                write!(f, "maximum acceleration must be positive (got {})", value)
            }
            Self::GearRatio(value) => write!(f, "gear ratio must be positive (got {})", value),
            Self::TicksPerRevolution(value) => {
                write!(f, "ticks per revolution must be positive (got {})", value)
            }
            Self::GainClamp(role, value) => {
                write!(f, "{:?} controller output clamp must not be negative (got {})", role, value)
            }
            Self::Tolerance(value) => write!(f, "tolerance must be positive (got {})", value),
            Self::LoopPeriod => write!(f, "loop period must be at least 1ms"),
            Self::WheelDistances => write!(f, "tracking wheel offsets must span a positive width"),
        }
    }
}

/// Check that a physical quantity is strictly positive (rejects NaN)
pub(crate) fn positive(value: f32, error: fn(f32) -> ConfigError) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(error(value))
    }
}
