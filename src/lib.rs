//!
//! Closed-loop motion control and position tracking for a four motor
//! differential drive chassis.
//!
//! The chassis owns its motors, tracking sensors and timing sources through the
//! capability traits in [`peripherals`] and [`clock`], so the same controller runs
//! against real hardware or a simulated robot.
//!
//! Every motion primitive is a blocking poll loop that runs on the caller's
//! execution context.  The controller is not reentrant and not thread-safe: a
//! single owner drives the chassis at a time, which `&mut self` enforces.
//!

#![no_std]

pub mod chassis;
pub use chassis::*;

pub mod clock;
pub use clock::*;

pub mod config;
pub use config::*;

pub mod errors;
pub use errors::*;

pub mod peripherals;
pub use peripherals::*;

pub mod tracking;
pub use tracking::*;

#[cfg(test)]
pub(crate) mod sim;
