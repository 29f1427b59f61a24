use nalgebra::Vector4;

/// Navigation mode requested by the path manager.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PathMode {
    #[default]
    Cruise,
    Takeoff,
    Landing,
    Loiter,
}

/// The latest instructions from the path manager.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PathCommands {
    /// Target roll in radians.
    pub roll: f32,
    /// Target pitch in radians.
    pub pitch: f32,
    /// Target yaw in radians.
    pub yaw: f32,
    /// Target airspeed in m/s.
    pub airspeed: f32,
    pub mode: PathMode,
}

/// Which sensors produced a reading in the last fusion update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SensorHealth {
    pub imu: bool,
    pub airspeed: bool,
    pub altitude: bool,
    pub gps: bool,
}

impl SensorHealth {
    /// Returns `true` if at least one sensor produced a reading.
    pub fn any(&self) -> bool {
        self.imu || self.airspeed || self.altitude || self.gps
    }
}

/// The fused attitude, rate and airspeed estimate.
///
/// Channels whose sensor failed hold their previous value and are marked in `health`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FusionOutput {
    /// Roll in radians, in (-PI, PI].
    pub roll: f32,
    /// Pitch in radians.
    pub pitch: f32,
    /// Yaw in radians, in (-PI, PI].
    pub yaw: f32,
    /// Body angular rates in radians per second.
    pub roll_rate: f32,
    pub pitch_rate: f32,
    pub yaw_rate: f32,
    /// Airspeed in m/s.
    pub airspeed: f32,
    /// Altitude in meters.
    pub altitude: f32,
    pub health: SensorHealth,
}

/// Control output for each axis.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PidOutput {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub airspeed: f32,
}

impl PidOutput {
    /// The outputs as `[roll, pitch, yaw, airspeed]`.
    pub fn to_vector(&self) -> Vector4<f32> {
        Vector4::new(self.roll, self.pitch, self.yaw, self.airspeed)
    }
}

/// A controlled axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    Roll,
    Pitch,
    Yaw,
    Airspeed,
}
