//!
//! Trapezoidal Motion Profile
//!
//! Generates the target position, velocity and acceleration of a move as a function
//! of the time since the move started.  The profile accelerates at the maximum
//! acceleration, cruises at the maximum velocity and then decelerates to a stop at
//! exactly the target distance.  Moves that are too short to reach the maximum
//! velocity collapse into a triangular profile.
//!

use libm::{fabsf, sqrtf};

/// The instantaneous target of a motion profile
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProfileState {
    /// Target position (m)
    pub position: f32,
    /// Target velocity (m/s)
    pub velocity: f32,
    /// Target acceleration (m/s^2)
    pub acceleration: f32,
}

impl ProfileState {
    /// Create a new profile state
    pub const fn new(position: f32, velocity: f32, acceleration: f32) -> Self {
        Self { position, velocity, acceleration }
    }

    /// Scale every term of the state by `factor`.  Used to slave a second profile
    /// (e.g. the inner wheel of an arc) to the timing of the first.
    pub fn scaled(self, factor: f32) -> Self {
        Self {
            position: self.position * factor,
            velocity: self.velocity * factor,
            acceleration: self.acceleration * factor,
        }
    }
}

/// Trapezoidal (or triangular) motion profile over a fixed distance
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrapezoidalProfile {
    /// Total distance travelled by the profile (m)
    distance: f32,
    /// Acceleration used for the ramps (m/s^2)
    acceleration: f32,
    /// Velocity reached at the end of the acceleration ramp (m/s)
    peak_velocity: f32,
    /// Duration of the acceleration ramp (and of the deceleration ramp) (s)
    acceleration_time: f32,
    /// Duration of the cruise phase (s)
    cruise_time: f32,
}

impl TrapezoidalProfile {
    /// Create a new profile for a move of `distance` meters.
    ///
    /// The distance is treated as a magnitude, callers are responsible for the
    /// direction of travel.  Both limits are expected to be positive.
    pub fn new(distance: f32, max_velocity: f32, max_acceleration: f32) -> Self {
        let distance = fabsf(distance);
        let max_velocity = fabsf(max_velocity);
        let acceleration = fabsf(max_acceleration);

        if distance == 0.0 || max_velocity == 0.0 || acceleration == 0.0 {
            return Self {
                distance,
                acceleration,
                peak_velocity: 0.0,
                acceleration_time: 0.0,
                cruise_time: 0.0,
            };
        }

        // Distance covered by accelerating to max velocity and back down again
        let ramp_distance = max_velocity * max_velocity / acceleration;

        let (peak_velocity, cruise_time) = if distance >= ramp_distance {
            (max_velocity, (distance - ramp_distance) / max_velocity)
        } else {
            // Triangular profile, the peak is where the two ramps meet halfway
            (sqrtf(distance * acceleration), 0.0)
        };

        Self {
            distance,
            acceleration,
            peak_velocity,
            acceleration_time: peak_velocity / acceleration,
            cruise_time,
        }
    }

    /// Total distance of the profile (m)
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Highest velocity the profile reaches (m/s)
    pub fn peak_velocity(&self) -> f32 {
        self.peak_velocity
    }

    /// Duration of each ramp (s)
    pub fn acceleration_time(&self) -> f32 {
        self.acceleration_time
    }

    /// Duration of the constant velocity phase (s), zero for triangular profiles
    pub fn cruise_time(&self) -> f32 {
        self.cruise_time
    }

    /// Whether the profile never reaches its cruise phase
    pub fn is_triangular(&self) -> bool {
        self.cruise_time == 0.0
    }

    /// Total duration of the profile (s)
    pub fn duration(&self) -> f32 {
        2.0 * self.acceleration_time + self.cruise_time
    }

    /// Sample the profile `t` seconds after the start of the move.
    ///
    /// Negative times are treated as the start of the move and times past the
    /// end of the profile hold the terminal `(distance, 0, 0)` state.
    pub fn sample(&self, t: f32) -> ProfileState {
        let t = if t > 0.0 { t } else { 0.0 };
        let a = self.acceleration;
        let cruise_start = self.acceleration_time;
        let cruise_end = self.acceleration_time + self.cruise_time;
        let duration = self.duration();

        if t >= duration {
            ProfileState::new(self.distance, 0.0, 0.0)
        } else if t < cruise_start {
            ProfileState::new(0.5 * a * t * t, a * t, a)
        } else if t < cruise_end {
            let ramp = 0.5 * a * cruise_start * cruise_start;
            ProfileState::new(
                ramp + self.peak_velocity * (t - cruise_start),
                self.peak_velocity,
                0.0,
            )
        } else {
            // Mirror the acceleration ramp from the end of the move
            let remaining = duration - t;
            ProfileState::new(self.distance - 0.5 * a * remaining * remaining, a * remaining, -a)
        }
    }
}
