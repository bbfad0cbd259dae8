//!
//! Motion Control Clock trait
//!
//! At the time of writing this, the embedded_hal did not have a great
//! interface for timestamp clocks, so this trait is to supplement for now.
//!

/// Clock used for motion control
pub trait MotionControlClock {
    /// Get the elapsed time from the last call too get_elapsed_time_us
    fn get_elapsed_time_us(&mut self) -> u32;
}

/// Accumulates the deltas reported by a [`MotionControlClock`] into the time
/// elapsed since the start of a motion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MotionTimer {
    elapsed_us: u64,
}

impl MotionTimer {
    /// Start a new timer, discarding whatever time the clock has accumulated
    /// since it was last read.
    pub fn start<CLK: MotionControlClock>(clock: &mut CLK) -> Self {
        let _ = clock.get_elapsed_time_us();
        Self { elapsed_us: 0 }
    }

    /// Read the clock and return the total elapsed time (us)
    pub fn tick<CLK: MotionControlClock>(&mut self, clock: &mut CLK) -> u64 {
        self.elapsed_us += clock.get_elapsed_time_us() as u64;
        self.elapsed_us
    }

    /// Total elapsed time (us) as of the last tick
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_us
    }

    /// Total elapsed time (s) as of the last tick
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed_us as f32 / 1_000_000.0
    }
}
