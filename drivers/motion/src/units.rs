//!
//! Conversions between encoder ticks and distance travelled by a wheel, along with
//! the angle helpers shared by the heading controllers.
//!

use core::f32::consts::PI;

use libm::fmodf;

/// Motor cartridge installed in a drive motor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gearset {
    /// 36:1 torque cartridge
    Red,
    /// 18:1 speed cartridge
    Green,
    /// 6:1 turbo cartridge
    Blue,
}

impl Gearset {
    /// The number of encoder ticks per rotation of the cartridge output shaft
    pub const fn ticks_per_revolution(&self) -> f32 {
        match self {
            Self::Red => 1800.0,
            Self::Green => 900.0,
            Self::Blue => 300.0,
        }
    }

    /// Free speed of the cartridge output shaft (rpm)
    pub const fn max_rpm(&self) -> f32 {
        match self {
            Self::Red => 100.0,
            Self::Green => 200.0,
            Self::Blue => 600.0,
        }
    }
}

/// Converts between encoder ticks and meters travelled by a wheel
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitConverter {
    /// Wheel Radius (m)
    pub wheel_radius: f32,
    /// Wheel rotations per rotation of the encoder shaft
    pub gear_ratio: f32,
    /// The number of encoder ticks per rotation of the encoder shaft
    pub ticks_per_revolution: f32,
}

impl UnitConverter {
    /// Converter for a drive motor's integrated encoder
    pub const fn for_drive(gearset: Gearset, gear_ratio: f32, wheel_radius: f32) -> Self {
        Self {
            wheel_radius,
            gear_ratio,
            ticks_per_revolution: gearset.ticks_per_revolution(),
        }
    }

    /// Converter for an unpowered tracking wheel mounted directly on its encoder
    pub const fn for_tracking_wheel(wheel_radius: f32, ticks_per_revolution: f32) -> Self {
        Self {
            wheel_radius,
            gear_ratio: 1.0,
            ticks_per_revolution,
        }
    }

    /// Distance travelled per rotation of the encoder shaft (m)
    #[inline(always)]
    fn meters_per_revolution(&self) -> f32 {
        2.0 * PI * self.wheel_radius * self.gear_ratio
    }

    #[inline(always)]
    /// Convert meters to encoder ticks
    pub fn meters_to_ticks(&self, meters: f32) -> f32 {
        meters / self.meters_per_revolution() * self.ticks_per_revolution
    }

    #[inline(always)]
    /// Convert encoder ticks to meters
    pub fn ticks_to_meters(&self, ticks: f32) -> f32 {
        ticks / self.ticks_per_revolution * self.meters_per_revolution()
    }
}

/// Wrap an angle in degrees into `[0, 360)`
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = fmodf(angle, 360.0);
    let wrapped = if wrapped < 0.0 { wrapped + 360.0 } else { wrapped };
    // -tiny + 360.0 can round up to exactly 360.0
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Shortest signed rotation (degrees) from `current` to `target`, in `(-180, 180]`
pub fn angle_error(target: f32, current: f32) -> f32 {
    let error = wrap_degrees(target - current);
    if error > 180.0 {
        error - 360.0
    } else {
        error
    }
}
