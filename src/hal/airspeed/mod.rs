//! Differential-pressure airspeed sensor on a 12-bit ADC.

use super::AirspeedSensor;
use crate::error::{AcquisitionStep, SensorError};
use num_traits::Float;

mod oneshot;
pub use oneshot::{OneShotChannel, OneShotError};

/// Full scale of the 12-bit converter.
pub const MAX_12_BIT_VALUE: u32 = 0xFFF;

/// Air density in kg/m³.
///
/// Held constant; temperature and pressure from the altimeter are not used
/// to correct it, which limits accuracy away from standard conditions.
pub const AIR_DENSITY: f32 = 1.2;

/// Negative differential pressure (in kPa) still read as zero airspeed.
/// From the transducer datasheet with added margin for the ADC.
pub const DIFF_PRESSURE_SENSOR_ERROR: f32 = 0.4;

/// Default time to wait for a conversion, in milliseconds.
pub const DEFAULT_POLL_TIMEOUT_MS: u32 = 55;

/// A single ADC channel driven through an explicit start, poll, read and stop sequence.
pub trait AdcChannel {
    type Error;

    fn start(&mut self) -> Result<(), Self::Error>;

    /// Wait at most `timeout_ms` for the conversion to complete.
    fn poll_for_conversion(&mut self, timeout_ms: u32) -> Result<(), Self::Error>;

    fn value(&mut self) -> Result<u32, Self::Error>;

    fn stop(&mut self) -> Result<(), Self::Error>;
}

impl<T> AdcChannel for &mut T
where
    T: AdcChannel + ?Sized,
{
    type Error = T::Error;

    fn start(&mut self) -> Result<(), Self::Error> {
        (**self).start()
    }

    fn poll_for_conversion(&mut self, timeout_ms: u32) -> Result<(), Self::Error> {
        (**self).poll_for_conversion(timeout_ms)
    }

    fn value(&mut self) -> Result<u32, Self::Error> {
        (**self).value()
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        (**self).stop()
    }
}

/// Convert a raw sample to differential pressure in kPa.
///
/// The transducer outputs `Vout = Vs * (0.2 * P + 0.5)`.
pub fn differential_pressure_kpa(raw: u32) -> f32 {
    (raw as f32 / MAX_12_BIT_VALUE as f32 - 0.5) / 0.2
}

/// Convert a differential pressure in kPa to airspeed in m/s with Bernoulli's equation.
pub fn airspeed_from_pressure(diff_pressure_kpa: f32) -> f32 {
    (2. * (1000. * diff_pressure_kpa) / AIR_DENSITY).sqrt()
}

/// Convert a raw 12-bit sample to airspeed in m/s.
///
/// Negative pressure within [`DIFF_PRESSURE_SENSOR_ERROR`] reads as zero; beyond it the sample is rejected.
pub fn airspeed_from_raw(raw: u32) -> Result<f32, SensorError> {
    if raw > MAX_12_BIT_VALUE {
        return Err(SensorError::OutOfRange(raw));
    }

    let mut diff_pressure_kpa = differential_pressure_kpa(raw);
    if diff_pressure_kpa < 0. {
        if diff_pressure_kpa.abs() < DIFF_PRESSURE_SENSOR_ERROR {
            diff_pressure_kpa = 0.;
        } else {
            return Err(SensorError::NegativePressure(diff_pressure_kpa));
        }
    }

    Ok(airspeed_from_pressure(diff_pressure_kpa))
}

/// An airspeed sensor read through an [`AdcChannel`].
pub struct Airspeed<A> {
    adc: A,
    timeout_ms: u32,
}

impl<A: AdcChannel> Airspeed<A> {
    pub fn new(adc: A) -> Self {
        Self::with_timeout(adc, DEFAULT_POLL_TIMEOUT_MS)
    }

    pub fn with_timeout(adc: A, timeout_ms: u32) -> Self {
        Self { adc, timeout_ms }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn free(self) -> A {
        self.adc
    }

    fn acquire(&mut self) -> Result<u32, SensorError> {
        self.adc.start().map_err(failed(AcquisitionStep::Start))?;
        self.adc
            .poll_for_conversion(self.timeout_ms)
            .map_err(failed(AcquisitionStep::Poll))?;
        let raw = self.adc.value().map_err(failed(AcquisitionStep::Value))?;
        self.adc.stop().map_err(failed(AcquisitionStep::Stop))?;

        Ok(raw)
    }
}

fn failed<E>(step: AcquisitionStep) -> impl FnOnce(E) -> SensorError {
    move |_| SensorError::Acquisition(step)
}

impl<A: AdcChannel> AirspeedSensor for Airspeed<A> {
    fn read(&mut self) -> Result<f32, SensorError> {
        let raw = self.acquire()?;
        airspeed_from_raw(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[derive(Default)]
    struct MockAdc {
        raw: u32,
        fail_at: Option<AcquisitionStep>,
        calls: [Option<AcquisitionStep>; 4],
        call_count: usize,
        timeout_ms: Option<u32>,
    }

    impl MockAdc {
        fn with_raw(raw: u32) -> Self {
            Self {
                raw,
                ..Self::default()
            }
        }

        fn step(&mut self, step: AcquisitionStep) -> Result<(), ()> {
            if self.call_count < self.calls.len() {
                self.calls[self.call_count] = Some(step);
            }
            self.call_count += 1;

            if self.fail_at == Some(step) {
                Err(())
            } else {
                Ok(())
            }
        }
    }

    impl AdcChannel for MockAdc {
        type Error = ();

        fn start(&mut self) -> Result<(), ()> {
            self.step(AcquisitionStep::Start)
        }

        fn poll_for_conversion(&mut self, timeout_ms: u32) -> Result<(), ()> {
            self.timeout_ms = Some(timeout_ms);
            self.step(AcquisitionStep::Poll)
        }

        fn value(&mut self) -> Result<u32, ()> {
            self.step(AcquisitionStep::Value).map(|_| self.raw)
        }

        fn stop(&mut self) -> Result<(), ()> {
            self.step(AcquisitionStep::Stop)
        }
    }

    #[test]
    fn steps_run_in_order() {
        let mut adc = MockAdc::with_raw(3000);
        Airspeed::new(&mut adc).read().unwrap();

        assert_eq!(
            adc.calls,
            [
                Some(AcquisitionStep::Start),
                Some(AcquisitionStep::Poll),
                Some(AcquisitionStep::Value),
                Some(AcquisitionStep::Stop),
            ]
        );
        assert_eq!(adc.timeout_ms, Some(DEFAULT_POLL_TIMEOUT_MS));
    }

    #[test]
    fn any_failed_step_fails_the_read() {
        for step in [
            AcquisitionStep::Start,
            AcquisitionStep::Poll,
            AcquisitionStep::Value,
            AcquisitionStep::Stop,
        ] {
            let mut adc = MockAdc::with_raw(4095);
            adc.fail_at = Some(step);

            let result = Airspeed::new(&mut adc).read();
            assert_eq!(result, Err(SensorError::Acquisition(step)));
        }
    }

    #[test]
    fn full_scale_sample() {
        let mut airspeed = Airspeed::new(MockAdc::with_raw(MAX_12_BIT_VALUE));
        assert_abs_diff_eq!(airspeed.read().unwrap(), 64.55, epsilon = 0.5);
    }

    #[test]
    fn midscale_reads_zero() {
        assert_eq!(airspeed_from_pressure(0.), 0.);

        // 2047 / 4095 sits just under half scale
        assert_eq!(airspeed_from_raw(2047), Ok(0.));
    }

    #[test]
    fn negative_pressure_within_margin_reads_zero() {
        for raw in 1720..2048 {
            let speed = airspeed_from_raw(raw).unwrap();
            assert_abs_diff_eq!(speed, 0., epsilon = 0.5);
        }
    }

    #[test]
    fn negative_pressure_beyond_margin_fails() {
        for raw in [0, 1000, 1719] {
            assert!(matches!(
                airspeed_from_raw(raw),
                Err(SensorError::NegativePressure(_))
            ));
        }
    }

    #[test]
    fn sample_beyond_full_scale_fails() {
        assert_eq!(airspeed_from_raw(4096), Err(SensorError::OutOfRange(4096)));
    }

    #[test]
    fn positive_pressure_follows_bernoulli() {
        // 3000 / 4095 => 1.163 kPa
        let expected = (2. * 1000. * differential_pressure_kpa(3000) / AIR_DENSITY).sqrt();
        assert_abs_diff_eq!(airspeed_from_raw(3000).unwrap(), expected);
        assert_abs_diff_eq!(expected, 44.03, epsilon = 0.05);
    }
}
