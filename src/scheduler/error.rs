use embedded_time::{clock, ConversionError};
use thiserror::Error;

/// Why the tick driver could not decide whether a tick is due.
#[derive(Error, Debug)]
pub enum TickError {
    /// The clock could not be read.
    #[error("clock unavailable: {0:?}")]
    ClockUnavailable(clock::Error),

    /// The clock reading does not fit in 32-bit microseconds.
    #[error("clock reading out of range: {0:?}")]
    OutOfRange(ConversionError),
}
