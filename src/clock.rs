//!
//! Clock Constants and Configuration
//!
//! Each motion primitive samples a [`MotionControlClock`] once per iteration and
//! then blocks on an `embedded_hal` delay until the next iteration.  The
//! controllers are dt-implicit, so the delay period must stay constant.
//!

pub use embedded_hal::blocking::delay::DelayMs;
pub use motion::{MotionControlClock, MotionTimer};

/// Period of the motion control loop (ms)
pub const LOOP_PERIOD_MS: u32 = 10;
/// Time a straight or arc drive may spend settling after its profile ends (ms)
pub const SETTLE_TIMEOUT_MS: u32 = 2_000;
/// Time a point turn may take before it is abandoned (ms)
pub const TURN_TIMEOUT_MS: u32 = 3_000;
/// Consecutive in-tolerance iterations before a turn counts as settled
pub const SETTLE_ITERATIONS: u32 = 3;
