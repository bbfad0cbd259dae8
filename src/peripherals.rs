//!
//! Hardware capabilities consumed by the chassis and the tracking.
//!
//! These traits are the boundary to the hardware access layer: reading a port's
//! raw tick count, commanding a raw voltage or velocity and reading the inertial
//! sensor.  Implementations are thin pass-throughs and are owned by the component
//! that constructs them.
//!

use motion::Gearset;

/// Maximum voltage a drive motor accepts (V)
pub const MAX_VOLTAGE: f32 = 12.0;

/// Units accepted by [`Actuator::set_velocity`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VelocityUnits {
    /// Rotations per minute of the cartridge output shaft
    Rpm,
    /// Degrees per second of the cartridge output shaft
    DegreesPerSecond,
    /// Percent of the cartridge's free speed
    Percent,
}

impl VelocityUnits {
    /// The largest velocity a motor with `gearset` can be commanded in these units
    pub fn max_velocity(&self, gearset: Gearset) -> f32 {
        match self {
            Self::Rpm => gearset.max_rpm(),
            Self::DegreesPerSecond => gearset.max_rpm() * 6.0,
            Self::Percent => 100.0,
        }
    }
}

/// A drive motor with an integrated encoder
pub trait Actuator {
    /// Command the motor to a voltage (V)
    fn set_voltage(&mut self, voltage: f32);
    /// Command the motor to a velocity
    fn set_velocity(&mut self, velocity: f32, units: VelocityUnits);
    /// Position of the integrated encoder (ticks)
    fn position(&self) -> f32;
    /// Zero the integrated encoder.
    ///
    /// For setup code only.  The chassis never calls this, it keeps its own
    /// baselines so the tracking never sees the count jump.
    fn reset_position(&mut self);
}

/// A standalone (tracking wheel) encoder
pub trait Encoder {
    /// Position of the encoder (ticks)
    fn position(&self) -> f32;
    /// Zero the encoder.
    ///
    /// For setup code only.  The tracking never calls this, it keeps its own
    /// baselines so a reset never shows up as wheel travel.
    fn reset(&mut self);
}

/// An inertial sensor reporting an absolute heading
pub trait Inertial {
    /// Heading in degrees, `[0, 360)`, increasing clockwise
    fn heading(&self) -> f32;
    /// Zero the heading
    fn reset(&mut self);
}

/// The four drive motors, `[front, back]` on each side
pub struct DriveMotors<M> {
    /// Left side motors (front, back)
    pub left: [M; 2],
    /// Right side motors (front, back)
    pub right: [M; 2],
}

impl<M> DriveMotors<M> {
    /// Group the drive motors by side
    pub fn new(left: [M; 2], right: [M; 2]) -> Self {
        Self { left, right }
    }
}
