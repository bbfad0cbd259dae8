//!
//! Simulated differential drive for running the closed loops on the host.
//!
//! Every peripheral shares one [`World`].  Wheel surface speed follows the
//! commanded voltage instantly, the inertial sensor reports the integrated heading
//! (plus an optional drift) and the delay is the only thing that advances time.
//!

extern crate std;

use core::cell::RefCell;
use core::f32::consts::PI;
use std::rc::Rc;

use libm::{cosf, sinf};
use motion::{wrap_degrees, Gearset, MotionControlClock, PidGains, UnitConverter};

use crate::{
    Actuator, Chassis, ChassisConfig, ConfigError, ControllerGains, DelayMs, Dimensions, DriveMotors, Encoder,
    FeedforwardGains, Inertial, Limits, Tolerances, Tracking, TrackingConfig, VelocityUnits,
    WheelDistances, TRACKING_TICKS_PER_REVOLUTION,
};

/// Wheel surface speed per volt ((m/s) / V)
pub const VELOCITY_PER_VOLT: f32 = 1.0 / 6.0;
/// Distance between the simulated drive wheels (m)
pub const TRACK_WIDTH: f32 = 0.3;
/// Simulated drive wheel radius (m)
pub const WHEEL_RADIUS: f32 = 0.04;
/// Simulated tracking wheel diameter (m)
pub const TRACKING_WHEEL_DIAMETER: f32 = 0.07;
/// Offset of the simulated back tracking wheel (m)
pub const BACK_OFFSET: f32 = 0.1;
/// Cartridge of the simulated drive motors
pub const GEARSET: Gearset = Gearset::Green;

pub type SharedWorld = Rc<RefCell<World>>;

/// The simulated robot and its surroundings
pub struct World {
    /// Simulated time (us)
    pub time_us: u64,
    /// Voltage reaching each motor, [left front, left back, right front, right back]
    pub voltages: [f32; 4],
    /// The last velocity command each motor received, cleared by voltage commands
    pub velocity_commands: [Option<(f32, VelocityUnits)>; 4],
    /// Distance travelled by the left wheels (m)
    pub left: f32,
    /// Distance travelled by the right wheels (m)
    pub right: f32,
    /// Distance travelled by the back tracking wheel (m)
    pub back: f32,
    /// True heading (rad, clockwise)
    pub heading: f32,
    /// True x position (m)
    pub x: f32,
    /// True y position (m)
    pub y: f32,
    /// Offset added to the inertial reading (degrees)
    pub inertial_offset: f32,
    /// Drift of the inertial reading (degrees / s)
    pub inertial_drift: f32,
    /// Whether the wheels are blocked
    pub stalled: bool,
    /// True heading (degrees) when the robot first moved forward or backward
    pub departure_heading: Option<f32>,
    drive_converter: UnitConverter,
    tracking_converter: UnitConverter,
}

impl World {
    pub fn new() -> SharedWorld {
        Rc::new(RefCell::new(Self {
            time_us: 0,
            voltages: [0.0; 4],
            velocity_commands: [None; 4],
            left: 0.0,
            right: 0.0,
            back: 0.0,
            heading: 0.0,
            x: 0.0,
            y: 0.0,
            inertial_offset: 0.0,
            inertial_drift: 0.0,
            stalled: false,
            departure_heading: None,
            drive_converter: UnitConverter::for_drive(GEARSET, 1.0, WHEEL_RADIUS),
            tracking_converter: UnitConverter::for_tracking_wheel(
                TRACKING_WHEEL_DIAMETER / 2.0,
                TRACKING_TICKS_PER_REVOLUTION,
            ),
        }))
    }

    fn side_velocity(&self, side: usize) -> f32 {
        if self.stalled {
            0.0
        } else {
            (self.voltages[2 * side] + self.voltages[2 * side + 1]) / 2.0 * VELOCITY_PER_VOLT
        }
    }

    /// Advance the simulation by `dt_us`
    pub fn step(&mut self, dt_us: u64) {
        let dt = dt_us as f32 / 1_000_000.0;
        let left_velocity = self.side_velocity(0);
        let right_velocity = self.side_velocity(1);

        let delta_heading = (left_velocity - right_velocity) / TRACK_WIDTH * dt;
        let forward = (left_velocity + right_velocity) / 2.0 * dt;
        let average_heading = self.heading + delta_heading / 2.0;

        if forward != 0.0 && self.departure_heading.is_none() {
            self.departure_heading = Some(self.heading_degrees());
        }

        self.x += forward * cosf(average_heading);
        self.y += forward * sinf(average_heading);
        self.left += left_velocity * dt;
        self.right += right_velocity * dt;
        self.back += BACK_OFFSET * delta_heading;
        self.heading += delta_heading;
        self.inertial_offset += self.inertial_drift * dt;
        self.time_us += dt_us;
    }

    /// True heading (degrees, `[0, 360)`)
    pub fn heading_degrees(&self) -> f32 {
        wrap_degrees(self.heading.to_degrees())
    }

    fn inertial_heading(&self) -> f32 {
        wrap_degrees(self.heading.to_degrees() + self.inertial_offset)
    }

    fn drive_ticks(&self, side: usize) -> f32 {
        let distance = if side == 0 { self.left } else { self.right };
        self.drive_converter.meters_to_ticks(distance)
    }
}

/// A drive motor, optionally mounted reversed
pub struct SimMotor {
    world: SharedWorld,
    index: usize,
    reversed: bool,
    offset: f32,
}

impl SimMotor {
    pub fn new(world: &SharedWorld, index: usize, reversed: bool) -> Self {
        Self { world: world.clone(), index, reversed, offset: 0.0 }
    }

    fn sign(&self) -> f32 {
        if self.reversed {
            -1.0
        } else {
            1.0
        }
    }
}

impl Actuator for SimMotor {
    fn set_voltage(&mut self, voltage: f32) {
        let mut world = self.world.borrow_mut();
        world.voltages[self.index] = self.sign() * voltage;
        world.velocity_commands[self.index] = None;
    }

    fn set_velocity(&mut self, velocity: f32, units: VelocityUnits) {
        let rpm = match units {
            VelocityUnits::Rpm => velocity,
            VelocityUnits::DegreesPerSecond => velocity / 6.0,
            VelocityUnits::Percent => velocity / 100.0 * GEARSET.max_rpm(),
        };
        let surface_speed = rpm / 60.0 * 2.0 * PI * WHEEL_RADIUS;

        let mut world = self.world.borrow_mut();
        world.voltages[self.index] = self.sign() * surface_speed / VELOCITY_PER_VOLT;
        world.velocity_commands[self.index] = Some((velocity, units));
    }

    fn position(&self) -> f32 {
        self.sign() * self.world.borrow().drive_ticks(self.index / 2) - self.offset
    }

    fn reset_position(&mut self) {
        self.offset = self.sign() * self.world.borrow().drive_ticks(self.index / 2);
    }
}

/// Which tracking wheel a [`SimEncoder`] reads
#[derive(Clone, Copy)]
pub enum TrackingWheel {
    Left,
    Right,
    Back,
}

/// A tracking wheel encoder.  The left/right wheels run on the drive wheel lines.
pub struct SimEncoder {
    world: SharedWorld,
    wheel: TrackingWheel,
    offset: f32,
}

impl SimEncoder {
    pub fn new(world: &SharedWorld, wheel: TrackingWheel) -> Self {
        Self { world: world.clone(), wheel, offset: 0.0 }
    }

    fn raw(&self) -> f32 {
        let world = self.world.borrow();
        let meters = match self.wheel {
            TrackingWheel::Left => world.left,
            TrackingWheel::Right => world.right,
            TrackingWheel::Back => world.back,
        };
        world.tracking_converter.meters_to_ticks(meters)
    }
}

impl Encoder for SimEncoder {
    fn position(&self) -> f32 {
        self.raw() - self.offset
    }

    fn reset(&mut self) {
        self.offset = self.raw();
    }
}

pub struct SimInertial(SharedWorld);

impl Inertial for SimInertial {
    fn heading(&self) -> f32 {
        self.0.borrow().inertial_heading()
    }

    fn reset(&mut self) {
        let mut world = self.0.borrow_mut();
        world.inertial_offset = -world.heading.to_degrees();
    }
}

pub struct SimClock {
    world: SharedWorld,
    last_us: u64,
}

impl MotionControlClock for SimClock {
    fn get_elapsed_time_us(&mut self) -> u32 {
        let now = self.world.borrow().time_us;
        let elapsed = now - self.last_us;
        self.last_us = now;
        elapsed as u32
    }
}

pub struct SimDelay(SharedWorld);

impl DelayMs<u32> for SimDelay {
    fn delay_ms(&mut self, ms: u32) {
        let mut world = self.0.borrow_mut();
        for _ in 0..ms {
            world.step(1_000);
        }
    }
}

pub type SimChassis = Chassis<SimMotor, SimEncoder, SimInertial, SimClock, SimDelay>;

/// Configuration matched to the simulated robot
pub fn chassis_config() -> ChassisConfig {
    ChassisConfig {
        gearset: GEARSET,
        gear_ratio: 1.0,
        dimensions: Dimensions {
            track_width: TRACK_WIDTH,
            wheel_diameter: 2.0 * WHEEL_RADIUS,
        },
        limits: Limits {
            max_velocity: 1.0,
            max_acceleration: 2.0,
        },
        gains: ControllerGains {
            distance: PidGains::new(20.0, 0.0, 0.0, 12.0),
            angle: PidGains::new(0.2, 0.0, 0.0, 4.0),
            turn: PidGains::new(0.5, 0.0, 0.0, 12.0),
        },
        feedforward: FeedforwardGains {
            kv: 1.0 / VELOCITY_PER_VOLT,
            ka: 0.0,
        },
        tolerances: Tolerances::default(),
        loop_period_ms: 10,
    }
}

fn motors(world: &SharedWorld, left_reversed: bool) -> DriveMotors<SimMotor> {
    DriveMotors::new(
        [
            SimMotor::new(world, 0, left_reversed),
            SimMotor::new(world, 1, left_reversed),
        ],
        [SimMotor::new(world, 2, false), SimMotor::new(world, 3, false)],
    )
}

fn build(
    world: &SharedWorld,
    config: ChassisConfig,
    tracking: Tracking<SimEncoder, SimInertial>,
    left_reversed: bool,
) -> Result<SimChassis, ConfigError> {
    Chassis::new(
        config,
        motors(world, left_reversed),
        tracking,
        SimClock { world: world.clone(), last_us: 0 },
        SimDelay(world.clone()),
    )
}

/// Chassis tracking off its drive motors and a back wheel
pub fn drive_encoder_chassis(config: ChassisConfig) -> (SharedWorld, SimChassis) {
    let (world, chassis) = try_drive_encoder_chassis(config, false);
    (world, chassis.unwrap())
}

/// Chassis tracking off its drive motors, optionally with the left motors
/// mounted reversed
pub fn try_drive_encoder_chassis(
    config: ChassisConfig,
    left_reversed: bool,
) -> (SharedWorld, Result<SimChassis, ConfigError>) {
    let world = World::new();
    let tracking = Tracking::drive_encoders(
        TrackingConfig::new(
            WheelDistances::from_track_width(TRACK_WIDTH, BACK_OFFSET),
            TRACKING_WHEEL_DIAMETER,
        ),
        Some(SimEncoder::new(&world, TrackingWheel::Back)),
        Some(SimInertial(world.clone())),
    )
    .unwrap();
    let chassis = build(&world, config, tracking, left_reversed);
    (world, chassis)
}

/// Chassis tracking off three dedicated tracking wheels
pub fn three_encoder_chassis(config: ChassisConfig) -> (SharedWorld, SimChassis) {
    three_encoder_chassis_with_inertial(config, true)
}

/// Chassis tracking off three dedicated tracking wheels, with or without an
/// inertial sensor
pub fn three_encoder_chassis_with_inertial(
    config: ChassisConfig,
    inertial: bool,
) -> (SharedWorld, SimChassis) {
    let world = World::new();
    let inertial = if inertial { Some(SimInertial(world.clone())) } else { None };
    let tracking = Tracking::three_encoder(
        TrackingConfig::new(
            WheelDistances {
                right: TRACK_WIDTH / 2.0,
                left: TRACK_WIDTH / 2.0,
                back: BACK_OFFSET,
            },
            TRACKING_WHEEL_DIAMETER,
        ),
        SimEncoder::new(&world, TrackingWheel::Left),
        SimEncoder::new(&world, TrackingWheel::Right),
        SimEncoder::new(&world, TrackingWheel::Back),
        inertial,
    )
    .unwrap();
    let chassis = build(&world, config, tracking, false).unwrap();
    (world, chassis)
}
