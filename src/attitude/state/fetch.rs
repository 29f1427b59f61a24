use crate::attitude::{Context, StateId};
use crate::error::Fault;
use crate::hal::PathSource;
use crate::log::log_info;

/// Pull the latest instructions from the path manager.
pub(crate) fn execute<P, S, Z>(context: &mut Context<P, S, Z>) -> StateId
where
    P: PathSource,
{
    match context.path.fetch() {
        Ok(commands) => {
            if commands.mode != context.path_commands.mode {
                log_info!("path mode changed to {}", commands.mode);
            }
            context.path_commands = commands;
            StateId::SensorFusion
        }
        Err(error) => context.fail(Fault::PathUnavailable(error)),
    }
}
