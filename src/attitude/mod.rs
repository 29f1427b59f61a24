//! The attitude manager state machine.
//!
//! Each call to [`AttitudeManager::tick`] runs exactly one state:
//! ```text
//! FetchInstructions -> SensorFusion -> PidLoop -> OutputMixing -> SendToSafety -> FetchInstructions
//! ```
//! Any state can route to [`StateId::FatalFailure`], which commands the fail-safe channels once
//! and then holds until the manager is [reset](AttitudeManager::reset).

use crate::config::AttitudeConfig;
use crate::error::Fault;
use crate::hal::{PathSource, SafetySink, Sensors};
use crate::log::{log_debug, log_error, log_info};

mod data;
pub use data::{Axis, FusionOutput, PathCommands, PathMode, PidOutput, SensorHealth};

mod state;
pub use state::fusion::{Estimator, Readings};
pub use state::pid_loop::AxisControllers;

pub use crate::mixing::ChannelCommands;

/// Number of ticks in one pass through the normal cycle.
pub const CYCLE_TICKS: u32 = 5;

/// Identifier of a state in the attitude manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StateId {
    FetchInstructions,
    SensorFusion,
    PidLoop,
    OutputMixing,
    SendToSafety,
    FatalFailure,
}

impl StateId {
    pub fn is_fatal(self) -> bool {
        self == StateId::FatalFailure
    }

    fn ops<P, S, Z>(self) -> StateOps<P, S, Z>
    where
        P: PathSource,
        S: Sensors,
        Z: SafetySink,
    {
        match self {
            StateId::FetchInstructions => StateOps::execute_only(state::fetch::execute),
            StateId::SensorFusion => StateOps::execute_only(state::fusion::execute),
            StateId::PidLoop => StateOps::execute_only(state::pid_loop::execute),
            StateId::OutputMixing => StateOps::execute_only(state::mixing::execute),
            StateId::SendToSafety => StateOps::execute_only(state::send::execute),
            StateId::FatalFailure => StateOps {
                enter: state::fatal::enter,
                execute: state::fatal::execute,
                exit: state::none,
            },
        }
    }
}

type StateFn<P, S, Z> = fn(&mut Context<P, S, Z>);

/// The enter, execute and exit behavior of a state.
struct StateOps<P, S, Z> {
    enter: StateFn<P, S, Z>,
    execute: fn(&mut Context<P, S, Z>) -> StateId,
    exit: StateFn<P, S, Z>,
}

impl<P, S, Z> StateOps<P, S, Z> {
    fn execute_only(execute: fn(&mut Context<P, S, Z>) -> StateId) -> Self {
        Self {
            enter: state::none,
            execute,
            exit: state::none,
        }
    }
}

/// Everything the states read and write, owned by the manager.
pub(crate) struct Context<P, S, Z> {
    pub(crate) config: AttitudeConfig,
    pub(crate) path: P,
    pub(crate) sensors: S,
    pub(crate) safety: Z,
    pub(crate) estimator: Estimator,
    pub(crate) controllers: AxisControllers,
    pub(crate) path_commands: PathCommands,
    pub(crate) fusion_output: FusionOutput,
    pub(crate) pid_output: PidOutput,
    pub(crate) channels: ChannelCommands,
    pub(crate) fault: Option<Fault>,
    pub(crate) dropped_cycles: u32,
}

impl<P, S, Z> Context<P, S, Z> {
    fn new(config: AttitudeConfig, path: P, sensors: S, safety: Z) -> Self {
        Self {
            estimator: Estimator::new(&config),
            controllers: AxisControllers::new(&config),
            config,
            path,
            sensors,
            safety,
            path_commands: PathCommands::default(),
            fusion_output: FusionOutput::default(),
            pid_output: PidOutput::default(),
            channels: [0.; 4],
            fault: None,
            dropped_cycles: 0,
        }
    }

    /// Record `fault` and route to fatal failure.
    pub(crate) fn fail(&mut self, fault: Fault) -> StateId {
        log_error!("fatal failure: {}", fault);
        self.fault = Some(fault);
        StateId::FatalFailure
    }

    fn reinitialize(&mut self) {
        self.estimator.reset();
        self.controllers.reset();
        self.path_commands = PathCommands::default();
        self.fusion_output = FusionOutput::default();
        self.pid_output = PidOutput::default();
        self.channels = [0.; 4];
        self.fault = None;
        self.dropped_cycles = 0;
    }
}

/// Attitude manager for a fixed-wing aircraft.
///
/// Owns the path manager link `P`, the sensors `S` and the safety processor link `Z`.
/// ```
/// use attitude_manager::{AttitudeConfig, AttitudeManager, StateId};
/// # use attitude_manager::{hal::*, error::*, attitude::*};
/// # struct Path;
/// # impl PathSource for Path {
/// #     fn fetch(&mut self) -> Result<PathCommands, PathError> { Ok(PathCommands::default()) }
/// # }
/// # struct Safety;
/// # impl SafetySink for Safety {
/// #     fn send(&mut self, _: &ChannelCommands) -> Result<(), SafetyError> { Ok(()) }
/// # }
/// # struct NoSensors;
/// # impl Sensors for NoSensors {
/// #     fn imu(&mut self) -> Result<ImuReading, SensorError> { Err(SensorError::NoData) }
/// #     fn airspeed(&mut self) -> Result<f32, SensorError> { Ok(15.) }
/// #     fn altitude(&mut self) -> Result<AltitudeReading, SensorError> { Err(SensorError::NoData) }
/// #     fn gps(&mut self) -> Result<GpsFix, SensorError> { Err(SensorError::NoData) }
/// # }
///
/// let mut manager = AttitudeManager::new(AttitudeConfig::default(), Path, NoSensors, Safety);
/// assert_eq!(manager.tick(), StateId::SensorFusion);
/// assert_eq!(manager.tick(), StateId::PidLoop);
/// ```
pub struct AttitudeManager<P, S, Z> {
    context: Context<P, S, Z>,
    state: StateId,
    last_run: Option<StateId>,
    ticks: u32,
}

impl<P, S, Z> AttitudeManager<P, S, Z>
where
    P: PathSource,
    S: Sensors,
    Z: SafetySink,
{
    /// Create a new manager starting in [`StateId::FetchInstructions`].
    pub fn new(config: AttitudeConfig, path: P, sensors: S, safety: Z) -> Self {
        Self {
            context: Context::new(config, path, sensors, safety),
            state: StateId::FetchInstructions,
            last_run: None,
            ticks: 0,
        }
    }

    /// Run the current state once and return the state for the next tick.
    pub fn tick(&mut self) -> StateId {
        let current = self.state;

        if self.last_run != Some(current) {
            if let Some(previous) = self.last_run {
                (previous.ops::<P, S, Z>().exit)(&mut self.context);
            }
            log_debug!("entering {}", current);
            (current.ops::<P, S, Z>().enter)(&mut self.context);
        }

        let next = (current.ops::<P, S, Z>().execute)(&mut self.context);

        self.last_run = Some(current);
        self.state = next;
        self.ticks = self.ticks.wrapping_add(1);
        next
    }

    /// Leave the current state and restart from [`StateId::FetchInstructions`]
    /// with fresh controllers and estimates.
    pub fn reset(&mut self) {
        if let Some(previous) = self.last_run.take() {
            (previous.ops::<P, S, Z>().exit)(&mut self.context);
        }
        if let Some(fault) = self.context.fault {
            log_info!("reset after fault: {}", fault);
        }

        self.context.reinitialize();
        self.state = StateId::FetchInstructions;
        self.ticks = 0;
    }
}

impl<P, S, Z> AttitudeManager<P, S, Z> {
    /// The state that runs on the next tick.
    pub fn state(&self) -> StateId {
        self.state
    }

    /// The most recent instructions from the path manager.
    pub fn path_commands(&self) -> &PathCommands {
        &self.context.path_commands
    }

    pub fn fusion_output(&self) -> &FusionOutput {
        &self.context.fusion_output
    }

    pub fn pid_output(&self) -> &PidOutput {
        &self.context.pid_output
    }

    /// The most recently mixed channel commands.
    pub fn channel_commands(&self) -> &ChannelCommands {
        &self.context.channels
    }

    /// The fault that caused fatal failure, if any.
    pub fn fault(&self) -> Option<Fault> {
        self.context.fault
    }

    /// Number of cycles whose channel commands were not delivered.
    pub fn dropped_cycles(&self) -> u32 {
        self.context.dropped_cycles
    }

    pub fn config(&self) -> &AttitudeConfig {
        &self.context.config
    }

    /// Number of ticks since creation or the last reset.
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn path(&self) -> &P {
        &self.context.path
    }

    pub fn path_mut(&mut self) -> &mut P {
        &mut self.context.path
    }

    pub fn sensors(&self) -> &S {
        &self.context.sensors
    }

    pub fn sensors_mut(&mut self) -> &mut S {
        &mut self.context.sensors
    }

    pub fn safety(&self) -> &Z {
        &self.context.safety
    }

    pub fn safety_mut(&mut self) -> &mut Z {
        &mut self.context.safety
    }
}
