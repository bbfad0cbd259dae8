//!
//! Closed-loop motion primitives for a four motor differential drive.
//!
//! Every primitive is a blocking poll loop.  Each iteration reads the clock,
//! advances the tracking, computes feedforward plus feedback outputs, commands
//! the motors and then blocks on the delay for one loop period.  A primitive
//! returns [`MotionOutcome::Reached`] once its target is held within tolerance or
//! [`MotionOutcome::TimedOut`] once its time budget runs out.  The motors are
//! stopped either way.
//!

use libm::{atan2f, fabsf, sqrtf};
use log::{debug, info, warn};
use motion::{angle_error, wrap_degrees, Pid, ProfileState, TrapezoidalProfile, UnitConverter};
use nalgebra::Vector3;

use crate::{
    Actuator, ChassisConfig, ConfigError, DelayMs, DriveMotors, Encoder, Inertial,
    MotionControlClock, MotionTimer, SideDistances, Tracking, VelocityUnits, MAX_VOLTAGE,
};

/// How a motion primitive ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionOutcome {
    /// The target was reached and held within tolerance
    Reached,
    /// The time budget ran out before the target was reached
    TimedOut,
}

impl MotionOutcome {
    /// Whether the target was reached
    pub fn is_reached(&self) -> bool {
        *self == Self::Reached
    }
}

#[inline(always)]
fn direction(reversed: bool) -> f32 {
    if reversed {
        -1.0
    } else {
        1.0
    }
}

/// Mean signed position (ticks) of the motors on one side
fn side_ticks<M: Actuator>(motors: &[M; 2], reversed: &[bool; 2]) -> f32 {
    motors
        .iter()
        .zip(reversed)
        .map(|(motor, &reversed)| direction(reversed) * motor.position())
        .sum::<f32>()
        / 2.0
}

/// Four motor differential drive chassis
pub struct Chassis<M, E, I, CLK, D> {
    config: ChassisConfig,
    motors: DriveMotors<M>,
    left_reversed: [bool; 2],
    right_reversed: [bool; 2],
    tracking: Tracking<E, I>,
    distance_pid: Pid,
    angle_pid: Pid,
    turn_pid: Pid,
    converter: UnitConverter,
    clock: CLK,
    delay: D,
    // Motor positions (ticks) at the last position reset
    left_baseline: f32,
    right_baseline: f32,
}

impl<M, E, I, CLK, D> Chassis<M, E, I, CLK, D>
where
    M: Actuator,
    E: Encoder,
    I: Inertial,
    CLK: MotionControlClock,
    D: DelayMs<u32>,
{
    /// Build a chassis, rejecting an invalid configuration
    pub fn new(
        config: ChassisConfig,
        motors: DriveMotors<M>,
        tracking: Tracking<E, I>,
        clock: CLK,
        delay: D,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut chassis = Self {
            config,
            motors,
            left_reversed: [false; 2],
            right_reversed: [false; 2],
            tracking,
            distance_pid: Pid::from_gains(config.gains.distance),
            angle_pid: Pid::from_gains(config.gains.angle),
            turn_pid: Pid::from_gains(config.gains.turn),
            converter: UnitConverter::for_drive(
                config.gearset,
                config.gear_ratio,
                config.dimensions.wheel_radius(),
            ),
            clock,
            delay,
            left_baseline: 0.0,
            right_baseline: 0.0,
        };
        chassis.update_tracking();
        chassis.reset_position();

        Ok(chassis)
    }

    /// The configuration the chassis was built with
    pub fn config(&self) -> &ChassisConfig {
        &self.config
    }

    /// Mark motors as mounted reversed, `[front, back]` on each side.  Commands
    /// and encoder readings of a reversed motor are negated.
    pub fn set_reverse_settings(&mut self, left: [bool; 2], right: [bool; 2]) {
        self.left_reversed = left;
        self.right_reversed = right;
    }

    /// Scale a pair of voltages so neither exceeds the motor voltage limit
    pub fn normalize(left: f32, right: f32) -> (f32, f32) {
        motion::normalize(left, right, MAX_VOLTAGE)
    }

    /// Command each side of the drive to a voltage (V)
    pub fn set_drive(&mut self, left_voltage: f32, right_voltage: f32) {
        let (left, right) = Self::normalize(left_voltage, right_voltage);

        for (motor, &reversed) in self.motors.left.iter_mut().zip(&self.left_reversed) {
            motor.set_voltage(direction(reversed) * left);
        }
        for (motor, &reversed) in self.motors.right.iter_mut().zip(&self.right_reversed) {
            motor.set_voltage(direction(reversed) * right);
        }
    }

    /// Command each side of the drive to a velocity.  The pair is scaled together
    /// so neither side exceeds the cartridge's ceiling in `units`.
    pub fn set_vel_drive(&mut self, left_velocity: f32, right_velocity: f32, units: VelocityUnits) {
        let limit = units.max_velocity(self.config.gearset);
        let (left, right) = motion::normalize(left_velocity, right_velocity, limit);

        for (motor, &reversed) in self.motors.left.iter_mut().zip(&self.left_reversed) {
            motor.set_velocity(direction(reversed) * left, units);
        }
        for (motor, &reversed) in self.motors.right.iter_mut().zip(&self.right_reversed) {
            motor.set_velocity(direction(reversed) * right, units);
        }
    }

    /// Stop all drive motors
    pub fn stop(&mut self) {
        self.set_drive(0.0, 0.0);
    }

    fn left_ticks(&self) -> f32 {
        side_ticks(&self.motors.left, &self.left_reversed)
    }

    fn right_ticks(&self) -> f32 {
        side_ticks(&self.motors.right, &self.right_reversed)
    }

    /// Left side displacement since the last position reset (m)
    pub fn left_encoder_value_motors(&self) -> f32 {
        self.converter.ticks_to_meters(self.left_ticks() - self.left_baseline)
    }

    /// Right side displacement since the last position reset (m)
    pub fn right_encoder_value_motors(&self) -> f32 {
        self.converter.ticks_to_meters(self.right_ticks() - self.right_baseline)
    }

    /// Mean displacement of both sides since the last position reset (m)
    pub fn average_encoder_value_motors(&self) -> f32 {
        (self.left_encoder_value_motors() + self.right_encoder_value_motors()) / 2.0
    }

    /// Mean forward displacement of the tracking's left/right pair since the last
    /// position reset (m)
    pub fn average_encoder_value_encoders(&self) -> f32 {
        self.tracking.average_encoder_value_encoders()
    }

    /// Convert a drive distance (m) to motor encoder ticks
    pub fn convert_meters_to_ticks(&self, meters: f32) -> f32 {
        self.converter.meters_to_ticks(meters)
    }

    /// Convert motor encoder ticks to a drive distance (m)
    pub fn convert_ticks_to_meters(&self, ticks: f32) -> f32 {
        self.converter.ticks_to_meters(ticks)
    }

    /// Zero the displacement of the drive motors and the tracking wheels at their
    /// current readings.  The pose estimate is kept.
    pub fn reset_position(&mut self) {
        self.left_baseline = self.left_ticks();
        self.right_baseline = self.right_ticks();
        let drive = self.side_distances();
        self.tracking.reset_position(drive);
    }

    /// Zero the heading
    pub fn reset_rotation(&mut self) {
        self.tracking.reset_rotation();
    }

    /// Advance the tracking with the latest sensor readings.  The motion
    /// primitives call this every iteration; call it periodically between them
    /// to keep the pose current.
    pub fn update_tracking(&mut self) -> Vector3<f32> {
        let drive = self.side_distances();
        self.tracking.update(drive)
    }

    /// Cumulative distance travelled by each side (m)
    fn side_distances(&self) -> SideDistances {
        SideDistances {
            left: self.converter.ticks_to_meters(self.left_ticks()),
            right: self.converter.ticks_to_meters(self.right_ticks()),
        }
    }

    /// Corrected heading (degrees, `[0, 360)`, clockwise)
    pub fn heading(&self) -> f32 {
        self.tracking.inertial_heading()
    }

    /// Estimated pose `(x (m), y (m), heading (degrees))`
    pub fn pose(&self) -> Vector3<f32> {
        self.tracking.pose()
    }

    /// Overwrite the pose estimate
    pub fn set_pose(&mut self, x: f32, y: f32, heading: f32) {
        self.tracking.set_pose(x, y, heading);
    }

    /// The chassis' tracking
    pub fn tracking(&self) -> &Tracking<E, I> {
        &self.tracking
    }

    /// Mutable access to the chassis' tracking
    pub fn tracking_mut(&mut self) -> &mut Tracking<E, I> {
        &mut self.tracking
    }

    fn wait(&mut self) {
        self.delay.delay_ms(self.config.loop_period_ms);
    }

    fn feedforward(&self, state: ProfileState) -> f32 {
        self.config.feedforward.voltage(state.velocity, state.acceleration)
    }

    /// Time a profiled drive may take before it is abandoned (s)
    fn drive_timeout(&self, profile: &TrapezoidalProfile) -> f32 {
        profile.duration() + self.config.tolerances.settle_timeout_ms as f32 / 1_000.0
    }

    /// Drive `distance` meters in a straight line along a trapezoidal profile
    /// while holding the current heading.
    ///
    /// `backwards` (or a negative distance) drives in reverse.  The motion is
    /// reached once the profile has finished and the mean displacement is within
    /// the distance tolerance.
    pub fn drive_straight_feedforward(&mut self, distance: f32, backwards: bool) -> MotionOutcome {
        self.update_tracking();
        let heading = self.tracking.inertial_heading();
        self.drive_straight_holding(distance, backwards, heading)
    }

    fn drive_straight_holding(&mut self, distance: f32, backwards: bool, heading: f32) -> MotionOutcome {
        let sign = if (distance < 0.0) != backwards { -1.0 } else { 1.0 };
        let limits = self.config.limits;
        let profile = TrapezoidalProfile::new(distance, limits.max_velocity, limits.max_acceleration);
        let target = profile.distance();
        let tolerance = self.config.tolerances.distance;
        let timeout = self.drive_timeout(&profile);

        debug!(
            "Driving {} m at heading {} (reverse: {}) over {} s",
            target,
            heading,
            sign < 0.0,
            profile.duration()
        );

        self.reset_position();
        self.distance_pid.reset();
        self.angle_pid.reset();

        let mut timer = MotionTimer::start(&mut self.clock);
        loop {
            timer.tick(&mut self.clock);
            let elapsed = timer.elapsed_seconds();
            self.update_tracking();

            let travelled = sign * self.average_encoder_value_motors();
            if elapsed >= profile.duration() && fabsf(target - travelled) <= tolerance {
                self.stop();
                info!("Drive reached {} of {} m in {} s", travelled, target, elapsed);
                return MotionOutcome::Reached;
            }
            if elapsed > timeout {
                self.stop();
                warn!("Drive timed out at {} of {} m", travelled, target);
                return MotionOutcome::TimedOut;
            }

            let state = profile.sample(elapsed);
            let power = self.feedforward(state) + self.distance_pid.update(state.position, travelled);
            let correction = self
                .angle_pid
                .update_error(angle_error(heading, self.tracking.inertial_heading()));

            self.set_drive(sign * power + correction, sign * power - correction);
            self.wait();
        }
    }

    /// Turn in place to an absolute heading (degrees, clockwise) along the
    /// shortest direction.
    ///
    /// The turn is reached once the heading error stays within the angle
    /// tolerance for the configured number of consecutive iterations.
    pub fn turn_to_degree_gyro(&mut self, angle: f32) -> MotionOutcome {
        let target = wrap_degrees(angle);
        let tolerances = self.config.tolerances;
        let settle_iterations = tolerances.settle_iterations.max(1);
        let timeout_us = tolerances.turn_timeout_ms as u64 * 1_000;

        debug!("Turning to {} degrees", target);

        self.turn_pid.reset();

        let mut settled = 0;
        let mut timer = MotionTimer::start(&mut self.clock);
        loop {
            timer.tick(&mut self.clock);
            self.update_tracking();

            let error = angle_error(target, self.tracking.inertial_heading());
            if fabsf(error) <= tolerances.angle {
                settled += 1;
            } else {
                settled = 0;
            }

            if settled >= settle_iterations {
                self.stop();
                info!("Turn reached {} degrees ({} off)", target, error);
                return MotionOutcome::Reached;
            }
            if timer.elapsed_us() > timeout_us {
                self.stop();
                warn!("Turn to {} degrees timed out {} degrees off", target, error);
                return MotionOutcome::TimedOut;
            }

            let output = self.turn_pid.update_error(error);
            self.set_drive(output, -output);
            self.wait();
        }
    }

    /// Drive an arc of `radius` meters (to the rotation center) that changes the
    /// heading by `exit_angle` degrees.
    ///
    /// A positive angle turns clockwise, so the left side runs the outer arc.
    /// One profile is planned over the outer arc and the inner side follows it
    /// scaled by the ratio of the arc lengths.  A radius below half the track
    /// width drives the inner side backwards.
    pub fn drive_arc_feedforward(&mut self, radius: f32, exit_angle: f32) -> MotionOutcome {
        let sweep = fabsf(exit_angle).to_radians();
        let radius = fabsf(radius);
        let half_track = self.config.dimensions.track_width / 2.0;
        let outer = (radius + half_track) * sweep;
        let inner = (radius - half_track) * sweep;

        if outer <= 0.0 {
            return MotionOutcome::Reached;
        }

        let (left_target, right_target) = if exit_angle >= 0.0 {
            (outer, inner)
        } else {
            (inner, outer)
        };
        let (left_scale, right_scale) = (left_target / outer, right_target / outer);

        let limits = self.config.limits;
        let profile = TrapezoidalProfile::new(outer, limits.max_velocity, limits.max_acceleration);
        let tolerance = self.config.tolerances.distance;
        let timeout = self.drive_timeout(&profile);

        debug!(
            "Driving arc of radius {} m through {} degrees (left {} m, right {} m)",
            radius, exit_angle, left_target, right_target
        );

        self.reset_position();
        self.distance_pid.reset();
        let mut right_pid = Pid::from_gains(self.config.gains.distance);

        let mut timer = MotionTimer::start(&mut self.clock);
        loop {
            timer.tick(&mut self.clock);
            let elapsed = timer.elapsed_seconds();
            self.update_tracking();

            let left = self.left_encoder_value_motors();
            let right = self.right_encoder_value_motors();
            if elapsed >= profile.duration()
                && fabsf(left_target - left) <= tolerance
                && fabsf(right_target - right) <= tolerance
            {
                self.stop();
                info!("Arc reached (left {} m, right {} m) in {} s", left, right, elapsed);
                return MotionOutcome::Reached;
            }
            if elapsed > timeout {
                self.stop();
                warn!(
                    "Arc timed out at left {} of {} m, right {} of {} m",
                    left, left_target, right, right_target
                );
                return MotionOutcome::TimedOut;
            }

            let state = profile.sample(elapsed);
            let left_state = state.scaled(left_scale);
            let right_state = state.scaled(right_scale);

            let left_voltage =
                self.feedforward(left_state) + self.distance_pid.update(left_state.position, left);
            let right_voltage =
                self.feedforward(right_state) + right_pid.update(right_state.position, right);

            self.set_drive(left_voltage, right_voltage);
            self.wait();
        }
    }

    /// Turn toward the field point `(x, y)` and drive straight to it, relative to
    /// the tracked pose.  `backwards` faces away from the point and reverses onto
    /// it.
    pub fn move_to_point(&mut self, x: f32, y: f32, backwards: bool) -> MotionOutcome {
        let pose = self.update_tracking();
        let (dx, dy) = (x - pose.x, y - pose.y);
        let distance = sqrtf(dx * dx + dy * dy);

        if distance <= self.config.tolerances.distance {
            return MotionOutcome::Reached;
        }

        let mut heading = atan2f(dy, dx).to_degrees();
        if backwards {
            heading += 180.0;
        }
        let heading = wrap_degrees(heading);

        debug!("Moving to ({}, {}): {} m at heading {}", x, y, distance, heading);

        if self.turn_to_degree_gyro(heading) == MotionOutcome::TimedOut {
            warn!("Abandoning move to ({}, {}) after the turn timed out", x, y);
            return MotionOutcome::TimedOut;
        }

        self.drive_straight_holding(distance, backwards, heading)
    }
}
