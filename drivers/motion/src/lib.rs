//!
//! Leaf motion algorithms for the chassis controller.  Nothing in here touches
//! hardware so it can be unit tested on the host.
//!

#![no_std]

pub mod pid;
pub use pid::{Pid, PidGains};

pub mod motion_profile;
pub use motion_profile::{ProfileState, TrapezoidalProfile};

pub mod units;
pub use units::{angle_error, wrap_degrees, Gearset, UnitConverter};

pub mod motion_control_clock;
pub use motion_control_clock::{MotionControlClock, MotionTimer};

/// Scale a pair of outputs down by a common factor so neither exceeds `limit`.
///
/// Clamping each side independently would change the ratio between the sides and
/// with it the curvature the robot drives, so both sides are scaled together.
/// Outputs already within the limit are returned unchanged.
pub fn normalize(left: f32, right: f32, limit: f32) -> (f32, f32) {
    let left_magnitude = libm::fabsf(left);
    let right_magnitude = libm::fabsf(right);
    let largest = if left_magnitude > right_magnitude { left_magnitude } else { right_magnitude };

    if largest > limit && largest > 0.0 {
        let scale = limit / largest;
        (left * scale, right * scale)
    } else {
        (left, right)
    }
}
