use crate::attitude::{Axis, Context, FusionOutput, PathCommands, PidOutput, StateId};
use crate::config::AttitudeConfig;
use crate::error::Fault;
use crate::filter::wrap_pi;
use crate::pid::PidController;

/// One PID controller per controlled axis.
#[derive(Clone, Debug)]
pub struct AxisControllers {
    pub roll: PidController,
    pub pitch: PidController,
    pub yaw: PidController,
    pub airspeed: PidController,
}

impl AxisControllers {
    /// Create controllers that run once per manager cycle.
    pub fn new(config: &AttitudeConfig) -> Self {
        let dt = config.control_period();
        Self {
            roll: PidController::new(config.roll_gains, dt),
            pitch: PidController::new(config.pitch_gains, dt),
            yaw: PidController::new(config.yaw_gains, dt),
            airspeed: PidController::new(config.airspeed_gains, dt),
        }
    }

    pub fn reset(&mut self) {
        self.roll.reset();
        self.pitch.reset();
        self.yaw.reset();
        self.airspeed.reset();
    }

    /// Drive each axis from the fused estimate toward the commanded target.
    ///
    /// The roll and yaw errors are taken along the shortest arc.
    /// Returns the first axis with a non-finite target, measurement or output;
    /// no controller is updated if an input is non-finite.
    pub fn update(
        &mut self,
        commands: &PathCommands,
        fusion: &FusionOutput,
    ) -> Result<PidOutput, Axis> {
        let inputs = [
            (Axis::Roll, commands.roll, fusion.roll),
            (Axis::Pitch, commands.pitch, fusion.pitch),
            (Axis::Yaw, commands.yaw, fusion.yaw),
            (Axis::Airspeed, commands.airspeed, fusion.airspeed),
        ];
        if let Some((axis, _, _)) = inputs
            .iter()
            .find(|(_, target, measured)| !target.is_finite() || !measured.is_finite())
        {
            return Err(*axis);
        }

        let output = PidOutput {
            roll: self
                .roll
                .update_with_error(wrap_pi(commands.roll - fusion.roll)),
            pitch: self.pitch.update(commands.pitch, fusion.pitch),
            yaw: self
                .yaw
                .update_with_error(wrap_pi(commands.yaw - fusion.yaw)),
            airspeed: self.airspeed.update(commands.airspeed, fusion.airspeed),
        };

        let outputs = [
            (Axis::Roll, output.roll),
            (Axis::Pitch, output.pitch),
            (Axis::Yaw, output.yaw),
            (Axis::Airspeed, output.airspeed),
        ];
        match outputs.iter().find(|(_, value)| !value.is_finite()) {
            Some((axis, _)) => Err(*axis),
            None => Ok(output),
        }
    }
}

/// Run every axis controller on the latest instructions and estimate.
pub(crate) fn execute<P, S, Z>(context: &mut Context<P, S, Z>) -> StateId {
    match context
        .controllers
        .update(&context.path_commands, &context.fusion_output)
    {
        Ok(output) => {
            context.pid_output = output;
            StateId::OutputMixing
        }
        Err(axis) => context.fail(Fault::NonFiniteControl(axis)),
    }
}
