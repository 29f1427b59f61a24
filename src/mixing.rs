use crate::attitude::PidOutput;
use nalgebra::{Matrix4, Vector4};

/// Number of actuator channels.
pub const CHANNEL_COUNT: usize = 4;

/// Actuator channel values ready for the safety processor.
pub type ChannelCommands = [f32; CHANNEL_COUNT];

/// The range of values an actuator channel accepts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelRange {
    pub min: f32,
    pub max: f32,
}

impl ChannelRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// A control surface deflection in percent of full travel.
    pub const fn surface() -> Self {
        Self::new(-100., 100.)
    }

    /// A throttle setting in percent.
    pub const fn throttle() -> Self {
        Self::new(0., 100.)
    }

    /// Returns `true` if `value` is finite and inside this range.
    pub fn contains(&self, value: f32) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

/// A channel command outside its declared range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutOfRange {
    pub channel: usize,
    pub value: f32,
}

/// Airframe mixing from the (roll, pitch, yaw, airspeed) control outputs to actuator channels.
///
/// `channels = matrix * [roll, pitch, yaw, airspeed] + trim`
#[derive(Clone, Debug, PartialEq)]
pub struct MixingMatrix {
    pub matrix: Matrix4<f32>,
    pub trim: Vector4<f32>,
    pub ranges: [ChannelRange; CHANNEL_COUNT],
}

impl MixingMatrix {
    pub fn new(
        matrix: Matrix4<f32>,
        trim: Vector4<f32>,
        ranges: [ChannelRange; CHANNEL_COUNT],
    ) -> Self {
        Self {
            matrix,
            trim,
            ranges,
        }
    }

    /// Aileron, elevator, rudder and throttle channels.
    ///
    /// The airspeed output (in -100 ~ +100) is mapped onto the 0 ~ 100 throttle range.
    pub fn conventional() -> Self {
        #[rustfmt::skip]
        let matrix = Matrix4::new(
            1., 0., 0., 0.,
            0., 1., 0., 0.,
            0., 0., 1., 0.,
            0., 0., 0., 0.5,
        );

        Self::new(
            matrix,
            Vector4::new(0., 0., 0., 50.),
            [
                ChannelRange::surface(),
                ChannelRange::surface(),
                ChannelRange::surface(),
                ChannelRange::throttle(),
            ],
        )
    }

    /// Left elevon, right elevon, rudder and throttle channels for a flying wing.
    ///
    /// Each elevon takes half of the pitch and roll command so the sum stays inside the surface range.
    pub fn elevon() -> Self {
        #[rustfmt::skip]
        let matrix = Matrix4::new(
            -0.5, 0.5, 0., 0.,
            0.5, 0.5, 0., 0.,
            0., 0., 1., 0.,
            0., 0., 0., 0.5,
        );

        Self {
            matrix,
            ..Self::conventional()
        }
    }

    /// Mix the control outputs into channel commands.
    pub fn mix(&self, output: &PidOutput) -> ChannelCommands {
        let channels = self.matrix * output.to_vector() + self.trim;
        [channels[0], channels[1], channels[2], channels[3]]
    }

    /// Find the first channel that is non-finite or outside its range.
    pub fn check(&self, channels: &ChannelCommands) -> Result<(), OutOfRange> {
        match channels
            .iter()
            .zip(self.ranges.iter())
            .position(|(value, range)| !range.contains(*value))
        {
            Some(channel) => Err(OutOfRange {
                channel,
                value: channels[channel],
            }),
            None => Ok(()),
        }
    }
}

impl Default for MixingMatrix {
    fn default() -> Self {
        Self::conventional()
    }
}
