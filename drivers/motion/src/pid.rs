//!
//! PID Controller Implementation in rust
//!
//! The controller is dt-implicit: the integral and derivative terms assume
//! `update` is called once per control loop iteration at a fixed period.
//!

/// Gains for a single controller role (distance, angle, turn, ...)
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct PidGains {
    /// The proportional gain of the controller
    pub kp: f32,
    /// The integral gain of the controller
    pub ki: f32,
    /// The derivative gain of the controller
    pub kd: f32,
    /// The maximum magnitude of the controller output `-max <= output <= max`
    pub max_output: f32,
}

impl PidGains {
    /// Create a new gain set
    pub const fn new(kp: f32, ki: f32, kd: f32, max_output: f32) -> Self {
        Self { kp, ki, kd, max_output }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
/// PID Controller implementation.
pub struct Pid {
    /// The maximum output to send to the actuators
    maximum_output: f32,
    /// The proportional gain of the controller
    kp: f32,
    /// The integral gain of the controller
    ki: f32,
    /// The derivative gain of the controller
    kd: f32,
    /// Limiter for the proportional gain `-p_limit <= P <= p_limit`
    p_limit: Option<f32>,
    /// Limiter for the integral gain `-i_limit <= I <= i_limit`
    i_limit: Option<f32>,
    /// Limiter for the derivative gain `-d_limit <= D <= d_limit`
    d_limit: Option<f32>,
    /// Last calculated integral value
    integral_term: f32,
    /// The error from the previous update
    previous_error: Option<f32>,
    /// A measurement of the error from the last update
    last_error: f32,
}

impl Pid {
    /// Create a new pid controller
    pub fn new(maximum_output: f32, kp: f32, ki: f32, kd: f32) -> Self {
        Self {
            maximum_output: if maximum_output < 0.0 { -maximum_output } else { maximum_output },
            kp,
            ki,
            kd,
            p_limit: None,
            i_limit: None,
            d_limit: None,
            integral_term: 0.0,
            previous_error: None,
            last_error: 0.0,
        }
    }

    /// Create a new pid controller from a gain set
    pub fn from_gains(gains: PidGains) -> Self {
        Self::new(gains.max_output, gains.kp, gains.ki, gains.kd)
    }

    /// Set the maximum p value
    pub fn set_p_limit(&mut self, p_limit: f32) {
        self.p_limit = Some(p_limit);
    }

    /// Set the maximum i value
    pub fn set_i_limit(&mut self, i_limit: f32) {
        self.i_limit = Some(i_limit);
    }

    /// Set the maximum d value
    pub fn set_d_limit(&mut self, d_limit: f32) {
        self.d_limit = Some(d_limit);
    }

    /// Get the last error value
    pub fn last_error(&self) -> f32 {
        self.last_error
    }

    /// The output clamp of this controller
    pub fn maximum_output(&self) -> f32 {
        self.maximum_output
    }

    /// Clear the integral and derivative history before starting a new motion
    pub fn reset(&mut self) {
        self.integral_term = 0.0;
        self.previous_error = None;
        self.last_error = 0.0;
    }

    /// Apply the pid controller to determine the next control output
    ///
    /// Returns: the clamped controller output
    pub fn update(&mut self, setpoint: f32, measurement: f32) -> f32 {
        self.update_error(setpoint - measurement)
    }

    /// Apply the pid controller to an already computed error (e.g. a wrapped
    /// heading error)
    pub fn update_error(&mut self, error: f32) -> f32 {
        self.last_error = error;

        // Calculate the proportional term
        let mut p = error * self.kp;
        if let Some(p_limit) = self.p_limit {
            p = clamp(p, p_limit);
        }

        // Calculate the i value
        self.integral_term += error * self.ki;
        if let Some(i_limit) = self.i_limit {
            self.integral_term = clamp(self.integral_term, i_limit);
        }

        // Calculate the d value
        let mut d = match self.previous_error {
            Some(previous_error) => (error - previous_error) * self.kd,
            None => 0.0,
        };
        self.previous_error = Some(error);
        if let Some(d_limit) = self.d_limit {
            d = clamp(d, d_limit);
        }

        clamp(p + self.integral_term + d, self.maximum_output)
    }
}

/// Clamp `value` to `-limit <= value <= limit`
#[inline(always)]
fn clamp(value: f32, limit: f32) -> f32 {
    if value > limit {
        limit
    } else if value < -limit {
        -limit
    } else {
        value
    }
}
