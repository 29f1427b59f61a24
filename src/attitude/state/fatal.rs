use crate::attitude::{Context, StateId};
use crate::hal::SafetySink;
use crate::log::{log_error, log_warn};

/// Command the fail-safe channels once.
pub(crate) fn enter<P, S, Z>(context: &mut Context<P, S, Z>)
where
    Z: SafetySink,
{
    let failsafe = context.config.failsafe;
    log_warn!("commanding fail-safe channels {}", failsafe);

    context.channels = failsafe;
    if let Err(error) = context.safety.send(&failsafe) {
        log_error!("fail-safe command not delivered: {}", error);
    }
}

/// Hold until reset.
pub(crate) fn execute<P, S, Z>(_context: &mut Context<P, S, Z>) -> StateId {
    StateId::FatalFailure
}
