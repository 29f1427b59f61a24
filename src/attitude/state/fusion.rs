use crate::attitude::{Context, FusionOutput, SensorHealth, StateId};
use crate::config::AttitudeConfig;
use crate::error::{Fault, SensorError};
use crate::filter::{ComplementaryFilter, HeadingFilter};
use crate::hal::{AltitudeReading, GpsFix, ImuReading, Sensors};
use crate::log::log_warn;
use nalgebra::Vector3;
use num_traits::Float;

/// One tick's worth of sensor reads.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Readings {
    pub imu: Result<ImuReading, SensorError>,
    pub airspeed: Result<f32, SensorError>,
    pub altitude: Result<AltitudeReading, SensorError>,
    pub gps: Result<GpsFix, SensorError>,
}

impl Readings {
    /// Read every sensor once.
    pub fn read<S: Sensors>(sensors: &mut S) -> Self {
        Self {
            imu: sensors.imu(),
            airspeed: sensors.airspeed(),
            altitude: sensors.altitude(),
            gps: sensors.gps(),
        }
    }

    pub fn health(&self) -> SensorHealth {
        SensorHealth {
            imu: self.imu.is_ok(),
            airspeed: self.airspeed.is_ok(),
            altitude: self.altitude.is_ok(),
            gps: self.gps.is_ok(),
        }
    }
}

/// Roll and pitch (in radians) of the gravity vector measured by an accelerometer.
///
/// `accel` is the specific force in the body frame (x forward, y right, z down),
/// so a level aircraft at rest reads `(0, 0, -g)`.
pub fn tilt_from_accel(accel: &Vector3<f32>) -> (f32, f32) {
    let roll = (-accel.y).atan2(-accel.z);
    let pitch = accel.x.atan2((accel.y * accel.y + accel.z * accel.z).sqrt());
    (roll, pitch)
}

/// Deterministic attitude, airspeed and altitude estimator.
///
/// Roll and pitch blend the integrated gyro with the accelerometer tilt.
/// Roll is blended along the shortest arc so an inverted aircraft stays inverted.
/// Yaw integrates the gyro and is pulled toward the GPS heading whenever a new fix is usable.
/// A failed sensor holds its channels at their previous value.
#[derive(Clone, Debug)]
pub struct Estimator {
    roll: ComplementaryFilter,
    pitch: ComplementaryFilter,
    heading: HeadingFilter,
    output: FusionOutput,
}

impl Estimator {
    pub fn new(config: &AttitudeConfig) -> Self {
        Self {
            roll: ComplementaryFilter::angle(config.attitude_alpha),
            pitch: ComplementaryFilter::new(config.attitude_alpha),
            heading: HeadingFilter::new(config.heading_alpha),
            output: FusionOutput::default(),
        }
    }

    /// Forget the estimate so the next readings initialise it again.
    pub fn reset(&mut self) {
        self.roll.clear();
        self.pitch.clear();
        self.heading.clear();
        self.output = FusionOutput::default();
    }

    /// Fold `readings` taken `dt` seconds after the previous update into the estimate.
    ///
    /// Returns [`Fault::ObservabilityLost`] and leaves the estimate untouched if every read failed.
    pub fn update(&mut self, readings: &Readings, dt: f32) -> Result<FusionOutput, Fault> {
        let health = readings.health();
        if !health.any() {
            return Err(Fault::ObservabilityLost);
        }

        if let Ok(imu) = &readings.imu {
            let (roll, pitch) = tilt_from_accel(&imu.accel);
            self.output.roll = self.roll.apply(imu.gyro.x, dt, roll);
            self.output.pitch = self.pitch.apply(imu.gyro.y, dt, pitch);
            self.heading.propagate(imu.gyro.z, dt);

            self.output.roll_rate = imu.gyro.x;
            self.output.pitch_rate = imu.gyro.y;
            self.output.yaw_rate = imu.gyro.z;
        }

        if let Ok(airspeed) = readings.airspeed {
            self.output.airspeed = airspeed;
        }

        match (&readings.altitude, &readings.gps) {
            (Ok(altimeter), _) => self.output.altitude = altimeter.altitude,
            (Err(_), Ok(fix)) if fix.fix_quality.is_valid() => {
                self.output.altitude = fix.altitude as f32
            }
            _ => {}
        }

        if let Ok(fix) = &readings.gps {
            if fix.is_usable() {
                self.heading.correct(fix.heading_radians());
            }
        }

        self.output.yaw = self.heading.output();
        self.output.health = health;
        Ok(self.output)
    }
}

/// Read the sensors and publish a fused estimate.
pub(crate) fn execute<P, S, Z>(context: &mut Context<P, S, Z>) -> StateId
where
    S: Sensors,
{
    let readings = Readings::read(&mut context.sensors);
    log_failed_reads(&readings);

    match context
        .estimator
        .update(&readings, context.config.control_period())
    {
        Ok(output) => {
            context.fusion_output = output;
            StateId::PidLoop
        }
        Err(fault) => context.fail(fault),
    }
}

fn log_failed_reads(readings: &Readings) {
    if let Err(error) = &readings.imu {
        log_warn!("imu read failed: {}", error);
    }
    if let Err(error) = &readings.airspeed {
        log_warn!("airspeed read failed: {}", error);
    }
    if let Err(error) = &readings.altitude {
        log_warn!("altimeter read failed: {}", error);
    }
    if let Err(error) = &readings.gps {
        log_warn!("gps read failed: {}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::{tilt_from_accel, Estimator, Readings};
    use crate::config::AttitudeConfig;
    use crate::error::{Fault, SensorError};
    use crate::hal::{AltitudeReading, FixQuality, GpsFix, ImuReading};
    use approx::assert_abs_diff_eq;
    use crate::filter::wrap_pi;
    use core::f32::consts::{FRAC_PI_2, PI};
    use nalgebra::Vector3;
    use num_traits::Float;

    const G: f32 = 9.81;

    fn level_imu() -> ImuReading {
        ImuReading {
            gyro: Vector3::zeros(),
            accel: Vector3::new(0., 0., -G),
        }
    }

    fn failed() -> Readings {
        Readings {
            imu: Err(SensorError::NoData),
            airspeed: Err(SensorError::NoData),
            altitude: Err(SensorError::NoData),
            gps: Err(SensorError::NoData),
        }
    }

    fn fix(heading: i16, altitude: i32) -> GpsFix {
        GpsFix {
            heading,
            altitude,
            fix_quality: FixQuality::Gps,
            is_new: true,
            ..GpsFix::default()
        }
    }

    #[test]
    fn tilt_of_level_and_banked_attitude() {
        let (roll, pitch) = tilt_from_accel(&Vector3::new(0., 0., -G));
        assert_abs_diff_eq!(roll, 0.);
        assert_abs_diff_eq!(pitch, 0.);

        // 30 degrees right wing down
        let roll_angle = 30f32.to_radians();
        let (roll, pitch) =
            tilt_from_accel(&Vector3::new(0., -G * roll_angle.sin(), -G * roll_angle.cos()));
        assert_abs_diff_eq!(roll, roll_angle, epsilon = 1e-5);
        assert_abs_diff_eq!(pitch, 0., epsilon = 1e-5);

        // 10 degrees nose up
        let pitch_angle = 10f32.to_radians();
        let (_, pitch) =
            tilt_from_accel(&Vector3::new(G * pitch_angle.sin(), 0., -G * pitch_angle.cos()));
        assert_abs_diff_eq!(pitch, pitch_angle, epsilon = 1e-5);
    }

    #[test]
    fn every_failed_read_loses_observability() {
        let mut estimator = Estimator::new(&AttitudeConfig::default());
        assert_eq!(
            estimator.update(&failed(), 0.025),
            Err(Fault::ObservabilityLost)
        );
    }

    #[test]
    fn failed_channels_hold_their_value() {
        let mut estimator = Estimator::new(&AttitudeConfig::default());
        let readings = Readings {
            imu: Ok(level_imu()),
            airspeed: Ok(18.),
            altitude: Ok(AltitudeReading {
                altitude: 120.,
                temperature: 15.,
            }),
            gps: Err(SensorError::NoData),
        };
        estimator.update(&readings, 0.025).unwrap();

        let degraded = Readings {
            airspeed: Err(SensorError::Timeout),
            ..failed()
        };
        let gps_only = Readings {
            gps: Ok(GpsFix {
                is_new: false,
                ..fix(0, 130)
            }),
            ..degraded
        };
        let output = estimator.update(&gps_only, 0.025).unwrap();

        assert_eq!(output.airspeed, 18.);
        assert!(!output.health.airspeed);
        assert!(output.health.gps);

        // Altitude falls back to the GPS fix
        assert_eq!(output.altitude, 130.);
    }

    #[test]
    fn heading_initialises_from_gps_then_integrates_the_gyro() {
        let mut estimator = Estimator::new(&AttitudeConfig::default());
        let readings = Readings {
            imu: Ok(level_imu()),
            gps: Ok(fix(90, 0)),
            ..failed()
        };
        let output = estimator.update(&readings, 0.025).unwrap();
        assert_abs_diff_eq!(output.yaw, FRAC_PI_2, epsilon = 1e-5);

        let turning = Readings {
            imu: Ok(ImuReading {
                gyro: Vector3::new(0., 0., 0.4),
                ..level_imu()
            }),
            ..failed()
        };
        let output = estimator.update(&turning, 0.5).unwrap();
        assert_abs_diff_eq!(output.yaw, FRAC_PI_2 + 0.2, epsilon = 1e-5);
        assert_eq!(output.yaw_rate, 0.4);
    }

    fn banked_imu(roll: f32) -> ImuReading {
        ImuReading {
            gyro: Vector3::zeros(),
            accel: Vector3::new(0., -G * roll.sin(), -G * roll.cos()),
        }
    }

    #[test]
    fn inverted_roll_stays_inverted_across_the_wrap() {
        let mut estimator = Estimator::new(&AttitudeConfig::default());
        let readings = Readings {
            imu: Ok(banked_imu(3.12)),
            ..failed()
        };
        let output = estimator.update(&readings, 0.025).unwrap();
        assert_abs_diff_eq!(output.roll, 3.12, epsilon = 1e-4);

        // Just past 180 degrees the tilt reads close to -PI
        let readings = Readings {
            imu: Ok(banked_imu(3.16)),
            ..failed()
        };
        for _ in 0..400 {
            let output = estimator.update(&readings, 0.025).unwrap();
            assert!(output.roll.abs() > 3.);
            assert!(output.roll.abs() <= PI);
        }
        let output = estimator.update(&readings, 0.025).unwrap();
        assert_abs_diff_eq!(output.roll, wrap_pi(3.16), epsilon = 1e-3);
    }

    #[test]
    fn reset_forgets_the_estimate() {
        let mut estimator = Estimator::new(&AttitudeConfig::default());
        let readings = Readings {
            imu: Ok(banked_imu(0.5)),
            gps: Ok(fix(90, 0)),
            ..failed()
        };
        estimator.update(&readings, 0.025).unwrap();

        estimator.reset();
        let output = estimator
            .update(
                &Readings {
                    imu: Ok(banked_imu(-0.3)),
                    ..failed()
                },
                0.025,
            )
            .unwrap();
        assert_abs_diff_eq!(output.roll, -0.3, epsilon = 1e-5);
        assert_eq!(output.yaw, 0.);
    }

    #[test]
    fn identical_readings_give_identical_estimates() {
        let readings = Readings {
            imu: Ok(ImuReading {
                gyro: Vector3::new(0.1, -0.05, 0.02),
                accel: Vector3::new(0.5, -1., -9.7),
            }),
            airspeed: Ok(20.),
            altitude: Err(SensorError::Bus),
            gps: Ok(fix(45, 80)),
        };

        let mut a = Estimator::new(&AttitudeConfig::default());
        let mut b = Estimator::new(&AttitudeConfig::default());
        for _ in 0..10 {
            assert_eq!(a.update(&readings, 0.025), b.update(&readings, 0.025));
        }
    }
}
