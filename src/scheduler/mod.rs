//! Fixed-rate tick source for the attitude manager.

use crate::attitude::{AttitudeManager, StateId};
use crate::hal::{PathSource, SafetySink, Sensors};
use crate::log::log_warn;
use embedded_time::{duration::Microseconds, Clock};

mod error;
pub use error::TickError;

/// Decides when the next manager tick is due from a microsecond clock.
///
/// The first poll is always due. Missed deadlines are counted as overruns and skipped,
/// so a late tick never triggers a burst of catch-up ticks.
pub struct TickDriver<C> {
    clock: C,
    period_us: u32,
    next_tick_us: Option<u32>,
    overruns: u32,
}

impl<C> TickDriver<C>
where
    C: Clock<T = u32>,
{
    pub fn new(clock: C, period: Microseconds<u32>) -> Self {
        Self {
            clock,
            period_us: period.0.max(1),
            next_tick_us: None,
            overruns: 0,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn period(&self) -> Microseconds<u32> {
        Microseconds::new(self.period_us)
    }

    /// Number of tick periods that passed without a tick.
    pub fn overruns(&self) -> u32 {
        self.overruns
    }

    /// Returns `true` if a tick is due now.
    pub fn poll(&mut self) -> Result<bool, TickError> {
        let now = self.micros_since_epoch()?.0;

        let next = match self.next_tick_us {
            Some(next) => next,
            None => {
                self.next_tick_us = Some(now.wrapping_add(self.period_us));
                return Ok(true);
            }
        };

        // Wrapping comparison of `now >= next`
        let late_us = now.wrapping_sub(next);
        if late_us > u32::MAX / 2 {
            return Ok(false);
        }

        let missed = late_us / self.period_us;
        if missed > 0 {
            self.overruns = self.overruns.saturating_add(missed);
            log_warn!("missed {} ticks ({} us late)", missed, late_us);
        }

        self.next_tick_us = Some(
            next.wrapping_add(self.period_us.wrapping_mul(missed.wrapping_add(1))),
        );
        Ok(true)
    }

    /// Tick `manager` if a tick is due, returning its next state.
    pub fn run<P, S, Z>(
        &mut self,
        manager: &mut AttitudeManager<P, S, Z>,
    ) -> Result<Option<StateId>, TickError>
    where
        P: PathSource,
        S: Sensors,
        Z: SafetySink,
    {
        if self.poll()? {
            Ok(Some(manager.tick()))
        } else {
            Ok(None)
        }
    }

    fn micros_since_epoch(&mut self) -> Result<Microseconds<u32>, TickError> {
        let instant = self.clock.try_now().map_err(TickError::ClockUnavailable)?;
        Microseconds::try_from(instant.duration_since_epoch()).map_err(TickError::OutOfRange)
    }
}

#[cfg(test)]
mod tests {
    use super::{TickDriver, TickError};
    use core::cell::Cell;
    use embedded_time::{clock, duration::Microseconds, rate::Fraction, Clock, Instant};

    struct MockClock {
        now: Cell<u32>,
    }

    impl MockClock {
        fn advance(&self, micros: u32) {
            self.now.set(self.now.get().wrapping_add(micros));
        }
    }

    impl Clock for MockClock {
        type T = u32;

        const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

        fn try_now(&self) -> Result<Instant<Self>, clock::Error> {
            Ok(Instant::new(self.now.get()))
        }
    }

    fn driver(start: u32) -> TickDriver<MockClock> {
        let clock = MockClock {
            now: Cell::new(start),
        };
        TickDriver::new(clock, Microseconds(1_000))
    }

    #[test]
    fn first_poll_is_due() {
        let mut driver = driver(0);
        assert!(driver.poll().unwrap());
        assert!(!driver.poll().unwrap());
    }

    #[test]
    fn ticks_once_per_period() {
        let mut driver = driver(0);
        driver.poll().unwrap();

        driver.clock().advance(999);
        assert!(!driver.poll().unwrap());

        driver.clock().advance(1);
        assert!(driver.poll().unwrap());
        assert!(!driver.poll().unwrap());
        assert_eq!(driver.overruns(), 0);
    }

    #[test]
    fn late_ticks_count_overruns_without_bursting() {
        let mut driver = driver(0);
        driver.poll().unwrap();

        // Next deadline was 1000, now 3500: the 2000 and 3000 deadlines were missed
        driver.clock().advance(3_500);
        assert!(driver.poll().unwrap());
        assert_eq!(driver.overruns(), 2);
        assert!(!driver.poll().unwrap());

        driver.clock().advance(500);
        assert!(driver.poll().unwrap());
    }

    #[test]
    fn survives_clock_wrap() {
        let mut driver = driver(u32::MAX - 500);
        driver.poll().unwrap();

        driver.clock().advance(900);
        assert!(!driver.poll().unwrap());

        driver.clock().advance(100);
        assert!(driver.poll().unwrap());
        assert_eq!(driver.overruns(), 0);
    }

    struct StoppedClock;

    impl Clock for StoppedClock {
        type T = u32;

        const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

        fn try_now(&self) -> Result<Instant<Self>, clock::Error> {
            Err(clock::Error::NotRunning)
        }
    }

    #[test]
    fn clock_failure_is_reported() {
        let mut driver = TickDriver::new(StoppedClock, Microseconds(1_000));
        assert!(matches!(
            driver.poll(),
            Err(TickError::ClockUnavailable(clock::Error::NotRunning))
        ));
    }
}
