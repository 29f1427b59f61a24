//! Interfaces to the collaborators outside the attitude manager.

use crate::attitude::{ChannelCommands, PathCommands};
use crate::error::{PathError, SafetyError, SensorError};
use nalgebra::Vector3;

pub mod airspeed;
pub use airspeed::{AdcChannel, Airspeed, OneShotChannel};

pub mod altimeter;
pub use altimeter::Mpl3115a2;

pub mod gps;
pub use gps::{FixQuality, GpsFix};

/// Gyroscope and accelerometer sample in the body frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImuReading {
    /// Angular rate in radians per second.
    pub gyro: Vector3<f32>,
    /// Specific force in meters per second squared.
    pub accel: Vector3<f32>,
}

/// Barometric altitude and temperature.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AltitudeReading {
    /// Altitude in meters.
    pub altitude: f32,
    /// Temperature in degrees Celsius.
    pub temperature: f32,
}

pub trait Imu {
    fn read(&mut self) -> Result<ImuReading, SensorError>;
}

pub trait AirspeedSensor {
    /// Read the airspeed in meters per second.
    fn read(&mut self) -> Result<f32, SensorError>;
}

pub trait Altimeter {
    fn read(&mut self) -> Result<AltitudeReading, SensorError>;
}

pub trait Gps {
    fn read(&mut self) -> Result<GpsFix, SensorError>;
}

/// Every sensor read by the sensor fusion state.
pub trait Sensors {
    fn imu(&mut self) -> Result<ImuReading, SensorError>;

    fn airspeed(&mut self) -> Result<f32, SensorError>;

    fn altitude(&mut self) -> Result<AltitudeReading, SensorError>;

    fn gps(&mut self) -> Result<GpsFix, SensorError>;
}

impl<T> Sensors for &mut T
where
    T: Sensors + ?Sized,
{
    fn imu(&mut self) -> Result<ImuReading, SensorError> {
        (**self).imu()
    }

    fn airspeed(&mut self) -> Result<f32, SensorError> {
        (**self).airspeed()
    }

    fn altitude(&mut self) -> Result<AltitudeReading, SensorError> {
        (**self).altitude()
    }

    fn gps(&mut self) -> Result<GpsFix, SensorError> {
        (**self).gps()
    }
}

/// [`Sensors`] built from one adapter per sensor.
pub struct SensorSuite<I, A, L, G> {
    pub imu: I,
    pub airspeed: A,
    pub altimeter: L,
    pub gps: G,
}

impl<I, A, L, G> SensorSuite<I, A, L, G> {
    pub fn new(imu: I, airspeed: A, altimeter: L, gps: G) -> Self {
        Self {
            imu,
            airspeed,
            altimeter,
            gps,
        }
    }
}

impl<I, A, L, G> Sensors for SensorSuite<I, A, L, G>
where
    I: Imu,
    A: AirspeedSensor,
    L: Altimeter,
    G: Gps,
{
    fn imu(&mut self) -> Result<ImuReading, SensorError> {
        self.imu.read()
    }

    fn airspeed(&mut self) -> Result<f32, SensorError> {
        self.airspeed.read()
    }

    fn altitude(&mut self) -> Result<AltitudeReading, SensorError> {
        self.altimeter.read()
    }

    fn gps(&mut self) -> Result<GpsFix, SensorError> {
        self.gps.read()
    }
}

/// The path manager producing navigation instructions.
pub trait PathSource {
    fn fetch(&mut self) -> Result<PathCommands, PathError>;
}

/// The safety processor consuming channel commands.
pub trait SafetySink {
    fn send(&mut self, channels: &ChannelCommands) -> Result<(), SafetyError>;
}

impl<T> PathSource for &mut T
where
    T: PathSource + ?Sized,
{
    fn fetch(&mut self) -> Result<PathCommands, PathError> {
        (**self).fetch()
    }
}

impl<T> SafetySink for &mut T
where
    T: SafetySink + ?Sized,
{
    fn send(&mut self, channels: &ChannelCommands) -> Result<(), SafetyError> {
        (**self).send(channels)
    }
}
