use num_traits::Float;

/// Gains and limits used to construct a [`PidController`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// The output is clamped to `-output_limit..=output_limit`.
    pub output_limit: f32,
    /// Integrator value on construction and after [`PidController::reset`].
    pub initial_integrator: f32,
}

impl PidGains {
    pub const fn new(kp: f32, ki: f32, kd: f32, output_limit: f32, initial_integrator: f32) -> Self {
        Self {
            kp,
            ki,
            kd,
            output_limit,
            initial_integrator,
        }
    }
}

impl Default for PidGains {
    /// A unity-gain proportional loop limited to ±100.
    fn default() -> Self {
        Self::new(1., 0., 0., 100., 0.)
    }
}

/// The terms of the last controller update.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Info {
    pub error: f32,
    pub p: f32,
    pub i: f32,
    pub d: f32,
    /// Set when the output was clamped to the limit.
    pub limit: bool,
}

/// A single-axis PID controller with a clamped output and conditional integration.
///
/// The integrator and last error survive between updates and are only
/// restored to their initial values by [`PidController::reset`].
#[derive(Clone, Debug)]
pub struct PidController {
    pub gains: PidGains,
    /// Timestep in seconds
    pub dt: f32,
    pub info: Info,
    integrator: f32,
    last_error: Option<f32>,
}

impl PidController {
    pub fn new(gains: PidGains, dt: f32) -> Self {
        Self {
            gains,
            dt,
            info: Info::default(),
            integrator: gains.initial_integrator,
            last_error: None,
        }
    }

    /// The accumulated integral of the error (in error units times seconds).
    pub fn integrator(&self) -> f32 {
        self.integrator
    }

    pub fn last_error(&self) -> Option<f32> {
        self.last_error
    }

    /// Restore the integrator and error history to their initial values.
    pub fn reset(&mut self) {
        self.integrator = self.gains.initial_integrator;
        self.last_error = None;
        self.info = Info::default();
    }

    /// Update the controller with a target and measurement and calculate the clamped output.
    pub fn update(&mut self, target: f32, measurement: f32) -> f32 {
        self.update_with_error(target - measurement)
    }

    /// Update the controller with a precomputed error and calculate the clamped output.
    ///
    /// A non-finite error leaves the controller untouched and returns NaN.
    pub fn update_with_error(&mut self, error: f32) -> f32 {
        if !error.is_finite() {
            return f32::NAN;
        }

        // The first update has no history, so it contributes no derivative kick
        let derivative = match self.last_error {
            Some(last_error) if self.dt > 0. => (error - last_error) / self.dt,
            _ => 0.,
        };
        self.last_error = Some(error);

        let p_out = error * self.gains.kp;
        let d_out = derivative * self.gains.kd;

        self.update_integral(error, p_out + d_out);
        let i_out = self.integrator * self.gains.ki;

        let limit = self.gains.output_limit;
        let unclamped = p_out + i_out + d_out;
        let output = unclamped.max(-limit).min(limit);

        self.info = Info {
            error,
            p: p_out,
            i: i_out,
            d: d_out,
            limit: output != unclamped,
        };

        output
    }

    /// Update the integral part of this controller.
    /// The step is skipped if it would drive the output further past its limit.
    fn update_integral(&mut self, error: f32, p_d_out: f32) {
        let ki = self.gains.ki;
        if ki == 0. || self.dt <= 0. {
            return;
        }

        let limit = self.gains.output_limit;
        let step = error * self.dt;
        let candidate = p_d_out + (self.integrator + step) * ki;
        let winding_up = candidate.abs() > limit && (step * ki).signum() == candidate.signum();

        if !winding_up {
            self.integrator += step;
        }

        // Bound the integral term itself to the output limit
        let max_integrator = limit / ki.abs();
        self.integrator = self.integrator.max(-max_integrator).min(max_integrator);
    }
}
