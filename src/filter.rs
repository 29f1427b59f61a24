use core::f32::consts::{PI, TAU};

/// Wrap an angle (in radians) into `(-PI, PI]`.
pub fn wrap_pi(angle: f32) -> f32 {
    let wrapped = angle % TAU;
    if wrapped > PI {
        wrapped - TAU
    } else if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Complementary filter blending a fast prediction with a slow absolute measurement.
///
/// The first measurement initialises the output directly.
/// An [angle](ComplementaryFilter::angle) filter blends along the shortest arc
/// and keeps its output in `(-PI, PI]`.
#[derive(Clone, Debug)]
pub struct ComplementaryFilter {
    /// Weight of the prediction in `0.0..=1.0`.
    pub alpha: f32,
    output: f32,
    wraps: bool,
    is_initialised: bool,
}

impl ComplementaryFilter {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            output: 0.,
            wraps: false,
            is_initialised: false,
        }
    }

    /// Create a filter for an angle in radians that wraps at ±PI.
    pub fn angle(alpha: f32) -> Self {
        Self {
            wraps: true,
            ..Self::new(alpha)
        }
    }

    pub fn output(&self) -> f32 {
        self.output
    }

    pub fn is_initialised(&self) -> bool {
        self.is_initialised
    }

    /// Blend the output propagated by `rate * dt` with `measurement`.
    pub fn apply(&mut self, rate: f32, dt: f32, measurement: f32) -> f32 {
        if !self.is_initialised {
            self.reset(measurement);
            return self.output;
        }

        let predicted = self.output + rate * dt;
        self.output = if self.wraps {
            let innovation = wrap_pi(measurement - predicted);
            wrap_pi(predicted + (1. - self.alpha) * innovation)
        } else {
            self.alpha * predicted + (1. - self.alpha) * measurement
        };
        self.output
    }

    pub fn reset(&mut self, value: f32) {
        self.is_initialised = true;
        self.output = if self.wraps { wrap_pi(value) } else { value };
    }

    /// Forget the output so the next measurement initialises it again.
    pub fn clear(&mut self) {
        self.is_initialised = false;
        self.output = 0.;
    }
}

/// Complementary filter for a heading, blending along the shortest arc.
///
/// The heading is relative to start-up until the first correction.
#[derive(Clone, Debug)]
pub struct HeadingFilter {
    /// Weight of the propagated heading in `0.0..=1.0`.
    pub alpha: f32,
    heading: f32,
    is_initialised: bool,
}

impl HeadingFilter {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            heading: 0.,
            is_initialised: false,
        }
    }

    pub fn is_initialised(&self) -> bool {
        self.is_initialised
    }

    /// The current heading in `(-PI, PI]`.
    pub fn output(&self) -> f32 {
        self.heading
    }

    pub fn propagate(&mut self, rate: f32, dt: f32) -> f32 {
        self.heading = wrap_pi(self.heading + rate * dt);
        self.heading
    }

    /// Pull the heading toward `measurement` (in radians).
    /// The first correction takes the measurement directly.
    pub fn correct(&mut self, measurement: f32) -> f32 {
        if !self.is_initialised {
            self.reset(measurement);
            return self.heading;
        }

        let error = wrap_pi(measurement - self.heading);
        self.heading = wrap_pi(self.heading + (1. - self.alpha) * error);
        self.heading
    }

    pub fn reset(&mut self, heading: f32) {
        self.is_initialised = true;
        self.heading = wrap_pi(heading);
    }

    pub fn clear(&mut self) {
        self.is_initialised = false;
        self.heading = 0.;
    }
}

#[cfg(test)]
mod tests {
    use super::{wrap_pi, ComplementaryFilter, HeadingFilter};
    use approx::assert_abs_diff_eq;
    use core::f32::consts::PI;
    use num_traits::Float;

    #[test]
    fn wraps_into_half_open_range() {
        assert_abs_diff_eq!(wrap_pi(0.5), 0.5);
        assert_abs_diff_eq!(wrap_pi(PI + 0.5), -PI + 0.5, epsilon = 1e-5);
        assert_abs_diff_eq!(wrap_pi(-PI - 0.5), PI - 0.5, epsilon = 1e-5);
        assert_abs_diff_eq!(wrap_pi(-PI), PI, epsilon = 1e-5);
    }

    #[test]
    fn first_measurement_initialises() {
        let mut filter = ComplementaryFilter::new(0.9);
        assert!(!filter.is_initialised());
        assert_eq!(filter.apply(10., 1., 0.2), 0.2);
        assert!(filter.is_initialised());

        filter.clear();
        assert_eq!(filter.apply(10., 1., -0.4), -0.4);
    }

    #[test]
    fn blends_prediction_and_measurement() {
        let mut filter = ComplementaryFilter::new(0.75);
        filter.reset(1.);

        // 0.75 * (1 + 2 * 0.5) + 0.25 * 0
        assert_abs_diff_eq!(filter.apply(2., 0.5, 0.), 1.5);
    }

    #[test]
    fn angle_blends_across_the_wrap() {
        let mut filter = ComplementaryFilter::angle(0.5);
        filter.reset(PI - 0.1);

        // Halfway along the short arc through PI, not back through zero
        assert_abs_diff_eq!(filter.apply(0., 0.01, -PI + 0.1).abs(), PI, epsilon = 1e-5);
        for _ in 0..50 {
            assert!(filter.apply(0., 0.01, -PI + 0.1).abs() > 3.);
        }
        assert_abs_diff_eq!(filter.output(), -PI + 0.1, epsilon = 1e-4);
    }

    #[test]
    fn angle_rate_propagates_through_the_wrap() {
        let mut filter = ComplementaryFilter::angle(1.);
        filter.reset(PI - 0.05);
        assert_abs_diff_eq!(filter.apply(1., 0.1, 0.), -PI + 0.05, epsilon = 1e-5);
    }

    #[test]
    fn heading_blends_across_the_wrap() {
        let mut heading = HeadingFilter::new(0.5);
        heading.reset(PI - 0.1);
        heading.correct(-PI + 0.1);
        assert_abs_diff_eq!(heading.output().abs(), PI, epsilon = 1e-5);
    }

    #[test]
    fn first_heading_correction_initialises() {
        let mut heading = HeadingFilter::new(0.9);
        heading.propagate(0.5, 1.);
        assert!(!heading.is_initialised());

        assert_abs_diff_eq!(heading.correct(-2.), -2.);
        assert_abs_diff_eq!(heading.correct(-1.), -1.9, epsilon = 1e-5);
    }
}
