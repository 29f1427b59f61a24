//! Error types shared by the collaborators and the attitude states.

use crate::attitude::Axis;
use thiserror::Error;

/// One step of an ADC acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AcquisitionStep {
    Start,
    Poll,
    Value,
    Stop,
}

/// A failed sensor read.
///
/// A sensor error only ever costs the current tick its reading for that
/// sensor; it is never fatal on its own.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    #[error("acquisition failed at the {0:?} step")]
    Acquisition(AcquisitionStep),

    #[error("raw sample {0} is outside the converter range")]
    OutOfRange(u32),

    #[error("differential pressure of {0} kPa is below the sensor error margin")]
    NegativePressure(f32),

    #[error("bus transfer failed")]
    Bus,

    #[error("unexpected device identity {0:#x}")]
    IdentityMismatch(u8),

    #[error("no data ready before the timeout")]
    Timeout,

    #[error("no valid data")]
    NoData,
}

/// The path manager could not provide instructions.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PathError {
    #[error("no instructions available")]
    Unavailable,

    #[error("instructions are stale")]
    Stale,

    #[error("path manager link failed")]
    Link,
}

/// Delivery of channel commands to the safety processor failed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SafetyError {
    /// Communication with the safety processor is gone.
    #[error("lost communication with the safety processor")]
    LinkLost,

    #[error("safety processor rejected the commands")]
    Rejected,

    #[error("safety transport busy")]
    Busy,
}

impl SafetyError {
    /// Returns `true` if this error means the safety processor can no longer be reached.
    pub fn is_link_loss(&self) -> bool {
        matches!(self, SafetyError::LinkLost)
    }
}

/// The reason the attitude manager entered fatal failure.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    #[error("path manager unavailable: {0}")]
    PathUnavailable(PathError),

    #[error("every sensor failed in the same tick")]
    ObservabilityLost,

    #[error("non-finite control value on the {0:?} axis")]
    NonFiniteControl(Axis),

    #[error("channel {channel} command {value} is outside the actuator range")]
    ChannelOutOfRange { channel: usize, value: f32 },

    #[error("safety processor link lost")]
    SafetyLinkLost,
}
