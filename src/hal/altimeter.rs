//! MPL3115A2 barometric altimeter over I2C.

use super::{AltitudeReading, Altimeter};
use crate::error::SensorError;
use embedded_hal::blocking::i2c::{Write, WriteRead};

pub const ADDRESS: u8 = 0x60;
pub const WHO_AM_I_VALUE: u8 = 0xC4;

mod register {
    pub const STATUS: u8 = 0x00;
    pub const OUT_P_MSB: u8 = 0x01;
    pub const WHO_AM_I: u8 = 0x0C;
    pub const PT_DATA_CFG: u8 = 0x13;
    pub const CTRL_REG1: u8 = 0x26;
}

mod ctrl {
    /// Altimeter mode (barometer when clear)
    pub const ALT: u8 = 0x80;
    /// 128x oversampling
    pub const OS128: u8 = 0x38;
    /// One-shot measurement
    pub const OST: u8 = 0x02;
}

/// Pressure/temperature data ready
const STATUS_PTDR: u8 = 0x08;

/// Data-ready event flags for pressure/altitude and temperature
const PT_DATA_CFG_EVENTS: u8 = 0x07;

/// Default number of status polls before a one-shot measurement times out.
pub const DEFAULT_MAX_POLLS: u16 = 1000;

/// Driver for the MPL3115A2 using one-shot measurements.
pub struct Mpl3115a2<I2C> {
    i2c: I2C,
    max_polls: u16,
}

impl<I2C, E> Mpl3115a2<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }

    /// Builder method to set the number of status polls per measurement.
    pub fn with_max_polls(mut self, max_polls: u16) -> Self {
        self.max_polls = max_polls.max(1);
        self
    }

    /// Check the device identity and configure it for altimeter one-shot measurements.
    pub fn init(&mut self) -> Result<(), SensorError> {
        let who_am_i = self.read_register(register::WHO_AM_I)?;
        if who_am_i != WHO_AM_I_VALUE {
            return Err(SensorError::IdentityMismatch(who_am_i));
        }

        self.write_register(register::PT_DATA_CFG, PT_DATA_CFG_EVENTS)?;
        self.write_register(register::CTRL_REG1, ctrl::ALT | ctrl::OS128)
    }

    /// Read the barometric pressure in kPa.
    ///
    /// Switches to barometer mode for one measurement and back to altimeter mode.
    pub fn pressure_kpa(&mut self) -> Result<f32, SensorError> {
        let data = self.measure(ctrl::OS128)?;
        self.write_register(register::CTRL_REG1, ctrl::ALT | ctrl::OS128)?;

        // Unsigned Q18.2 pascals
        let raw = (u32::from(data[0]) << 16 | u32::from(data[1]) << 8 | u32::from(data[2])) >> 4;
        Ok(raw as f32 / 4. / 1000.)
    }

    pub fn free(self) -> I2C {
        self.i2c
    }

    /// Trigger a one-shot measurement in `mode` and read pressure/altitude and temperature.
    fn measure(&mut self, mode: u8) -> Result<[u8; 5], SensorError> {
        self.write_register(register::CTRL_REG1, mode)?;
        self.write_register(register::CTRL_REG1, mode | ctrl::OST)?;

        let mut ready = false;
        for _ in 0..self.max_polls {
            if self.read_register(register::STATUS)? & STATUS_PTDR != 0 {
                ready = true;
                break;
            }
        }
        if !ready {
            return Err(SensorError::Timeout);
        }

        let mut data = [0; 5];
        self.i2c
            .write_read(ADDRESS, &[register::OUT_P_MSB], &mut data)
            .map_err(|_| SensorError::Bus)?;
        Ok(data)
    }

    fn read_register(&mut self, register: u8) -> Result<u8, SensorError> {
        let mut value = [0];
        self.i2c
            .write_read(ADDRESS, &[register], &mut value)
            .map_err(|_| SensorError::Bus)?;
        Ok(value[0])
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(ADDRESS, &[register, value])
            .map_err(|_| SensorError::Bus)
    }
}

/// Convert altitude registers (signed Q16.4 meters) to meters.
fn altitude_from_registers(msb: u8, csb: u8, lsb: u8) -> f32 {
    let raw = (i32::from(msb) << 24 | i32::from(csb) << 16 | i32::from(lsb) << 8) >> 12;
    raw as f32 / 16.
}

/// Convert temperature registers (signed Q8.4 degrees Celsius) to degrees Celsius.
fn temperature_from_registers(msb: u8, lsb: u8) -> f32 {
    let raw = (i16::from(msb as i8) << 8 | i16::from(lsb)) >> 4;
    raw as f32 / 16.
}

impl<I2C, E> Altimeter for Mpl3115a2<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    fn read(&mut self) -> Result<AltitudeReading, SensorError> {
        let data = self.measure(ctrl::ALT | ctrl::OS128)?;

        Ok(AltitudeReading {
            altitude: altitude_from_registers(data[0], data[1], data[2]),
            temperature: temperature_from_registers(data[3], data[4]),
        })
    }
}
