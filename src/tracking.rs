//!
//! Position tracking for the chassis.
//!
//! Tracking fuses the inertial sensor with the heading implied by the left/right
//! tracking displacements and integrates the result into an `(x, y, heading)`
//! pose.  The inertial sensor carries the short term heading change while the
//! corrected heading is continuously pulled toward the tracking wheel heading,
//! which keeps slow inertial drift out of long runs.  Without an inertial sensor
//! the heading comes from the tracking wheels alone.
//!
//! Headings are in degrees and increase clockwise like the inertial sensor.  The
//! field `y` axis is 90 degrees clockwise of the `x` axis, so a heading of
//! `atan2(y, x)` points at `(x, y)`.
//!

use libm::{cosf, fabsf, sinf};
use log::{debug, warn};
use motion::{angle_error, wrap_degrees, UnitConverter};
use nalgebra::Vector3;

use crate::{errors::positive, ConfigError, Encoder, Inertial};

/// Weighting for the inertial heading change
pub const ALPHA: f32 = 0.15;
/// Weighting for the inertial heading change when the tracking wheels disagree
/// enough that they are probably slipping
pub const HIGH_ALPHA: f32 = 0.80;
/// Per-update disagreement (degrees) above which the tracking wheels are assumed
/// to be slipping
pub const SLIP_CUTOFF: f32 = 2.0;
/// Per-update disagreement (degrees) that is worth reporting
pub const DISAGREEMENT_WARNING: f32 = 15.0;
/// Fraction of the gap to the tracking wheel heading closed on every update
pub const DRIFT_CORRECTION: f32 = 0.02;
/// Ticks per revolution of a standard tracking wheel encoder
pub const TRACKING_TICKS_PER_REVOLUTION: f32 = 360.0;

/// Offsets of the tracking wheels from the rotation center (m)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WheelDistances {
    /// Right tracking wheel to rotation center
    pub right: f32,
    /// Left tracking wheel to rotation center
    pub left: f32,
    /// Back tracking wheel to rotation center
    pub back: f32,
}

impl WheelDistances {
    /// Offsets for tracking off the drive wheels themselves
    pub fn from_track_width(track_width: f32, back: f32) -> Self {
        Self {
            right: track_width / 2.0,
            left: track_width / 2.0,
            back,
        }
    }

    /// Distance between the left and right tracking wheels (m)
    pub fn track_width(&self) -> f32 {
        self.left + self.right
    }
}

/// Tracking wheel geometry
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackingConfig {
    /// Tracking wheel offsets
    pub wheels: WheelDistances,
    /// Diameter of the tracking wheels (m)
    pub wheel_diameter: f32,
    /// Ticks per revolution of the tracking encoders
    pub ticks_per_revolution: f32,
}

impl TrackingConfig {
    /// Tracking geometry with standard tracking encoders
    pub fn new(wheels: WheelDistances, wheel_diameter: f32) -> Self {
        Self {
            wheels,
            wheel_diameter,
            ticks_per_revolution: TRACKING_TICKS_PER_REVOLUTION,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let wheels = self.wheels;
        if !(wheels.left >= 0.0 && wheels.right >= 0.0 && wheels.back >= 0.0)
            || !(wheels.track_width() > 0.0)
        {
            return Err(ConfigError::WheelDistances);
        }
        positive(self.wheel_diameter, ConfigError::WheelDiameter)?;
        positive(self.ticks_per_revolution, ConfigError::TicksPerRevolution)
    }
}

/// The sensors backing the left/right displacement terms
pub enum TrackingSensors<E> {
    /// Three dedicated tracking wheels
    ThreeEncoder {
        /// Left tracking wheel
        left: E,
        /// Right tracking wheel
        right: E,
        /// Back (lateral) tracking wheel
        back: E,
    },
    /// Left/right displacement comes from the drive motors' integrated encoders,
    /// optionally with a back tracking wheel
    DriveEncoders {
        /// Back (lateral) tracking wheel
        back: Option<E>,
    },
}

/// Cumulative distance travelled by each side of the drive (m)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SideDistances {
    /// Left side (m)
    pub left: f32,
    /// Right side (m)
    pub right: f32,
}

/// One sample of every tracking input
#[derive(Clone, Copy, Debug)]
struct Reading {
    left: f32,
    right: f32,
    back: f32,
    inertial: Option<f32>,
}

/// Heading and position tracking
pub struct Tracking<E, I> {
    sensors: TrackingSensors<E>,
    inertial: Option<I>,
    wheels: WheelDistances,
    converter: UnitConverter,
    // Corrected heading (degrees)
    heading: f32,
    // Heading implied by the tracking wheels, following the corrected heading
    // while they slip (degrees)
    wheel_heading: f32,
    // The previous reading, `None` until the first update
    last: Option<Reading>,
    // Side distances at the last position reset
    baseline: SideDistances,
    // (x (m), y (m), heading (degrees))
    pose: Vector3<f32>,
}

impl<E: Encoder, I: Inertial> Tracking<E, I> {
    /// Track off three dedicated tracking wheels (left, right, back)
    pub fn three_encoder(
        config: TrackingConfig,
        left: E,
        right: E,
        back: E,
        inertial: Option<I>,
    ) -> Result<Self, ConfigError> {
        Self::new(config, TrackingSensors::ThreeEncoder { left, right, back }, inertial)
    }

    /// Track off the drive motors' integrated encoders, with an optional back
    /// tracking wheel.  The wheel offsets should describe the drive wheels
    /// (see [`WheelDistances::from_track_width`]).
    pub fn drive_encoders(
        config: TrackingConfig,
        back: Option<E>,
        inertial: Option<I>,
    ) -> Result<Self, ConfigError> {
        Self::new(config, TrackingSensors::DriveEncoders { back }, inertial)
    }

    /// Create a new tracking from any sensor topology, with or without an
    /// inertial sensor
    pub fn new(
        config: TrackingConfig,
        sensors: TrackingSensors<E>,
        inertial: Option<I>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let heading = inertial.as_ref().map_or(0.0, |inertial| wrap_degrees(inertial.heading()));

        Ok(Self {
            sensors,
            inertial,
            wheels: config.wheels,
            converter: UnitConverter::for_tracking_wheel(
                config.wheel_diameter / 2.0,
                config.ticks_per_revolution,
            ),
            heading,
            wheel_heading: heading,
            last: None,
            baseline: SideDistances::default(),
            pose: Vector3::new(0.0, 0.0, heading),
        })
    }

    /// Whether the left/right displacement comes from the drive motors
    pub fn uses_drive_encoders(&self) -> bool {
        matches!(self.sensors, TrackingSensors::DriveEncoders { .. })
    }

    /// Whether an inertial sensor contributes to the heading
    pub fn has_inertial(&self) -> bool {
        self.inertial.is_some()
    }

    fn read(&self, drive: SideDistances) -> Reading {
        let inertial = self.inertial.as_ref().map(|inertial| inertial.heading());
        match &self.sensors {
            TrackingSensors::ThreeEncoder { left, right, back } => Reading {
                left: self.converter.ticks_to_meters(left.position()),
                right: self.converter.ticks_to_meters(right.position()),
                back: self.converter.ticks_to_meters(back.position()),
                inertial,
            },
            TrackingSensors::DriveEncoders { back } => Reading {
                left: drive.left,
                right: drive.right,
                back: back
                    .as_ref()
                    .map_or(0.0, |back| self.converter.ticks_to_meters(back.position())),
                inertial,
            },
        }
    }

    /// Blend an inertial heading change with the tracking wheel heading change.
    ///
    /// Returns the fused change and whether the wheels are assumed to be slipping.
    fn fuse(inertial_delta: f32, encoder_delta: f32) -> (f32, bool) {
        let disagreement = fabsf(inertial_delta - encoder_delta);
        let slipping = disagreement > SLIP_CUTOFF;
        let alpha = if slipping {
            debug!("Tracking wheels slipping: {} degrees of disagreement", disagreement);
            HIGH_ALPHA
        } else {
            ALPHA
        };
        if disagreement > DISAGREEMENT_WARNING {
            warn!(
                "Inertial heading change {} disagrees with tracking wheels {}",
                inertial_delta, encoder_delta
            );
        }

        (inertial_delta * alpha + encoder_delta * (1.0 - alpha), slipping)
    }

    /// Sample the sensors and advance the heading and pose estimate.
    ///
    /// `drive` is the cumulative distance travelled by each drive side, it is only
    /// used when tracking off the drive encoders.  Call once per control loop
    /// iteration.
    pub fn update(&mut self, drive: SideDistances) -> Vector3<f32> {
        let reading = self.read(drive);
        let last = match self.last.replace(reading) {
            Some(last) => last,
            None => {
                self.baseline = SideDistances { left: reading.left, right: reading.right };
                return self.pose;
            }
        };

        let delta_left = reading.left - last.left;
        let delta_right = reading.right - last.right;
        let delta_back = reading.back - last.back;

        // Heading change implied by the tracking wheels
        let encoder_delta = ((delta_left - delta_right) / self.wheels.track_width()).to_degrees();

        let (fused_delta, slipping) = match (reading.inertial, last.inertial) {
            (Some(current), Some(previous)) => {
                Self::fuse(angle_error(current, previous), encoder_delta)
            }
            _ => (encoder_delta, false),
        };

        self.wheel_heading = wrap_degrees(
            self.wheel_heading + if slipping { fused_delta } else { encoder_delta },
        );

        let previous_heading = self.heading;
        let heading = wrap_degrees(previous_heading + fused_delta);
        self.heading = wrap_degrees(
            heading + DRIFT_CORRECTION * angle_error(self.wheel_heading, heading),
        );
        let heading_delta = angle_error(self.heading, previous_heading);

        // The back wheel sweeps an arc when the robot rotates in place
        let forward = (delta_left + delta_right) / 2.0;
        let lateral = delta_back - self.wheels.back * heading_delta.to_radians();

        let average_heading = (previous_heading + heading_delta / 2.0).to_radians();
        let (sin, cos) = (sinf(average_heading), cosf(average_heading));
        self.pose.x += forward * cos - lateral * sin;
        self.pose.y += forward * sin + lateral * cos;
        self.pose.z = self.heading;

        self.pose
    }

    /// Corrected heading (degrees, `[0, 360)`), not the raw inertial reading
    pub fn inertial_heading(&self) -> f32 {
        self.heading
    }

    /// Uncorrected inertial sensor heading (degrees), `None` without an inertial
    /// sensor
    pub fn raw_inertial_heading(&self) -> Option<f32> {
        self.inertial.as_ref().map(|inertial| inertial.heading())
    }

    /// Mean forward displacement of the active left/right pair since the last
    /// position reset (m)
    pub fn average_encoder_value_encoders(&self) -> f32 {
        match self.last {
            Some(last) => {
                ((last.left - self.baseline.left) + (last.right - self.baseline.right)) / 2.0
            }
            None => 0.0,
        }
    }

    /// Estimated pose `(x (m), y (m), heading (degrees))`
    pub fn pose(&self) -> Vector3<f32> {
        self.pose
    }

    /// Overwrite the pose estimate, e.g. with a known starting position
    pub fn set_pose(&mut self, x: f32, y: f32, heading: f32) {
        self.heading = wrap_degrees(heading);
        self.wheel_heading = self.heading;
        self.pose = Vector3::new(x, y, self.heading);
    }

    /// Zero the displacement baseline at the current sensor readings.  Movement
    /// since the previous update is integrated into the pose first, the pose is
    /// kept.
    pub fn reset_position(&mut self, drive: SideDistances) {
        self.update(drive);
        if let Some(last) = self.last {
            self.baseline = SideDistances { left: last.left, right: last.right };
        }
    }

    /// Zero the inertial sensor and the corrected heading
    pub fn reset_rotation(&mut self) {
        if let Some(inertial) = self.inertial.as_mut() {
            inertial.reset();
        }
        self.heading = 0.0;
        self.wheel_heading = 0.0;
        self.pose.z = 0.0;
        let inertial = self.raw_inertial_heading();
        if let Some(last) = self.last.as_mut() {
            last.inertial = inertial;
        }
    }
}
