/// GPS fix quality as reported by the receiver (the NMEA GGA quality field).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FixQuality {
    NoFix,
    Gps,
    Differential,
    Other(u8),
}

impl FixQuality {
    /// Returns `true` if the receiver reports a position fix.
    pub fn is_valid(&self) -> bool {
        !matches!(self, FixQuality::NoFix)
    }
}

impl From<u8> for FixQuality {
    fn from(code: u8) -> Self {
        match code {
            0 => FixQuality::NoFix,
            1 => FixQuality::Gps,
            2 => FixQuality::Differential,
            code => FixQuality::Other(code),
        }
    }
}

impl From<FixQuality> for u8 {
    fn from(quality: FixQuality) -> Self {
        match quality {
            FixQuality::NoFix => 0,
            FixQuality::Gps => 1,
            FixQuality::Differential => 2,
            FixQuality::Other(code) => code,
        }
    }
}

/// The latest fix from a GPS receiver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GpsFix {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Time of day in seconds since 00:00 UTC.
    pub utc_time: f32,
    /// Ground speed in m/s.
    pub ground_speed: f32,
    /// Altitude in meters.
    pub altitude: i32,
    /// Heading in degrees, expected in 0..=360.
    pub heading: i16,
    pub satellites: u8,
    pub fix_quality: FixQuality,
    /// Set if the data changed since the previous read.
    pub is_new: bool,
}

impl GpsFix {
    /// The heading in radians.
    pub fn heading_radians(&self) -> f32 {
        f32::from(self.heading).to_radians()
    }

    /// Returns `true` if this fix is new and the receiver has a position fix.
    pub fn is_usable(&self) -> bool {
        self.is_new && self.fix_quality.is_valid()
    }
}

impl Default for GpsFix {
    fn default() -> Self {
        Self {
            latitude: 0.,
            longitude: 0.,
            utc_time: 0.,
            ground_speed: 0.,
            altitude: 0,
            heading: 0,
            satellites: 0,
            fix_quality: FixQuality::NoFix,
            is_new: false,
        }
    }
}
