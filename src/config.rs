//! Configuration for the attitude manager.

use crate::attitude::CYCLE_TICKS;
use crate::mixing::{ChannelCommands, MixingMatrix};
use crate::pid::PidGains;
use embedded_time::duration::Microseconds;

/// Default manager tick period (200 hz)
pub const DEFAULT_TICK_PERIOD_US: u32 = 5_000;

/// Default weight of the gyro prediction in the roll/pitch estimate.
pub const DEFAULT_ATTITUDE_ALPHA: f32 = 0.98;

/// Default weight of the gyro prediction in the heading estimate.
pub const DEFAULT_HEADING_ALPHA: f32 = 0.95;

/// Tunables fixed at system initialization.
#[derive(Clone, Debug, PartialEq)]
pub struct AttitudeConfig {
    /// Time between manager ticks.
    pub tick_period: Microseconds<u32>,
    pub roll_gains: PidGains,
    pub pitch_gains: PidGains,
    pub yaw_gains: PidGains,
    pub airspeed_gains: PidGains,
    pub mixer: MixingMatrix,
    /// Channels commanded on entry to fatal failure.
    pub failsafe: ChannelCommands,
    /// Weight of the gyro prediction in the roll/pitch estimate (0 ~ 1).
    pub attitude_alpha: f32,
    /// Weight of the gyro prediction in the heading estimate (0 ~ 1).
    pub heading_alpha: f32,
}

impl AttitudeConfig {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Time (in seconds) between two runs of the same pipeline state.
    pub fn control_period(&self) -> f32 {
        self.tick_period.0 as f32 * 1e-6 * CYCLE_TICKS as f32
    }
}

impl Default for AttitudeConfig {
    fn default() -> Self {
        Builder::default().build()
    }
}

pub struct Builder {
    tick_period: Microseconds<u32>,
    roll_gains: PidGains,
    pitch_gains: PidGains,
    yaw_gains: PidGains,
    airspeed_gains: PidGains,
    mixer: MixingMatrix,
    failsafe: Option<ChannelCommands>,
    attitude_alpha: f32,
    heading_alpha: f32,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            tick_period: Microseconds(DEFAULT_TICK_PERIOD_US),
            roll_gains: PidGains::default(),
            pitch_gains: PidGains::default(),
            yaw_gains: PidGains::default(),
            airspeed_gains: PidGains::default(),
            mixer: MixingMatrix::default(),
            failsafe: None,
            attitude_alpha: DEFAULT_ATTITUDE_ALPHA,
            heading_alpha: DEFAULT_HEADING_ALPHA,
        }
    }
}

impl Builder {
    pub fn tick_period(mut self, tick_period: Microseconds<u32>) -> Self {
        self.tick_period = tick_period;
        self
    }

    pub fn roll_gains(mut self, gains: PidGains) -> Self {
        self.roll_gains = gains;
        self
    }

    pub fn pitch_gains(mut self, gains: PidGains) -> Self {
        self.pitch_gains = gains;
        self
    }

    pub fn yaw_gains(mut self, gains: PidGains) -> Self {
        self.yaw_gains = gains;
        self
    }

    pub fn airspeed_gains(mut self, gains: PidGains) -> Self {
        self.airspeed_gains = gains;
        self
    }

    pub fn mixer(mut self, mixer: MixingMatrix) -> Self {
        self.mixer = mixer;
        self
    }

    pub fn failsafe(mut self, channels: ChannelCommands) -> Self {
        self.failsafe = Some(channels);
        self
    }

    pub fn attitude_alpha(mut self, alpha: f32) -> Self {
        self.attitude_alpha = alpha.max(0.).min(1.);
        self
    }

    pub fn heading_alpha(mut self, alpha: f32) -> Self {
        self.heading_alpha = alpha.max(0.).min(1.);
        self
    }

    /// Build the configuration.
    /// Without an explicit fail-safe, every channel is set to the low end of its range clamped to zero.
    pub fn build(self) -> AttitudeConfig {
        let failsafe = self.failsafe.unwrap_or_else(|| {
            let mut channels = [0.; 4];
            for (channel, range) in channels.iter_mut().zip(self.mixer.ranges.iter()) {
                *channel = 0f32.max(range.min).min(range.max);
            }
            channels
        });

        AttitudeConfig {
            tick_period: self.tick_period,
            roll_gains: self.roll_gains,
            pitch_gains: self.pitch_gains,
            yaw_gains: self.yaw_gains,
            airspeed_gains: self.airspeed_gains,
            mixer: self.mixer,
            failsafe,
            attitude_alpha: self.attitude_alpha,
            heading_alpha: self.heading_alpha,
        }
    }
}
