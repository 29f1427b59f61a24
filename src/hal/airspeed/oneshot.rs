use super::AdcChannel;
use core::marker::PhantomData;
use embedded_hal::adc::{Channel, OneShot};
use embedded_hal::blocking::delay::DelayUs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneShotError<E> {
    /// The converter reported an error.
    Adc(E),
    /// The conversion did not complete before the timeout.
    Timeout,
    /// A value was requested before a conversion completed.
    NoSample,
}

/// An [`AdcChannel`] backed by an `embedded-hal` one-shot ADC and pin.
///
/// Polling is bounded: the converter is checked every `poll_interval_us`
/// until the timeout given to [`AdcChannel::poll_for_conversion`] expires.
pub struct OneShotChannel<Adc, W, A, P, D> {
    adc: A,
    pin: P,
    delay: D,
    poll_interval_us: u16,
    sample: Option<u32>,
    _marker: PhantomData<(Adc, W)>,
}

impl<Adc, W, A, P, D> OneShotChannel<Adc, W, A, P, D> {
    pub fn new(adc: A, pin: P, delay: D, poll_interval_us: u16) -> Self {
        Self {
            adc,
            pin,
            delay,
            poll_interval_us: poll_interval_us.max(1),
            sample: None,
            _marker: PhantomData,
        }
    }

    pub fn free(self) -> (A, P, D) {
        (self.adc, self.pin, self.delay)
    }
}

impl<Adc, W, A, P, D> AdcChannel for OneShotChannel<Adc, W, A, P, D>
where
    A: OneShot<Adc, W, P>,
    P: Channel<Adc>,
    W: Into<u32>,
    D: DelayUs<u16>,
{
    type Error = OneShotError<A::Error>;

    fn start(&mut self) -> Result<(), Self::Error> {
        self.sample = None;
        Ok(())
    }

    fn poll_for_conversion(&mut self, timeout_ms: u32) -> Result<(), Self::Error> {
        let timeout_us = timeout_ms.saturating_mul(1000);
        let mut waited_us: u32 = 0;

        loop {
            match self.adc.read(&mut self.pin) {
                Ok(word) => {
                    self.sample = Some(word.into());
                    return Ok(());
                }
                Err(nb::Error::Other(error)) => return Err(OneShotError::Adc(error)),
                Err(nb::Error::WouldBlock) => {
                    if waited_us >= timeout_us {
                        return Err(OneShotError::Timeout);
                    }
                    self.delay.delay_us(self.poll_interval_us);
                    waited_us = waited_us.saturating_add(u32::from(self.poll_interval_us));
                }
            }
        }
    }

    fn value(&mut self) -> Result<u32, Self::Error> {
        self.sample.ok_or(OneShotError::NoSample)
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        self.sample = None;
        Ok(())
    }
}
