use crate::attitude::{Context, StateId};
use crate::error::Fault;
use crate::hal::SafetySink;
use crate::log::log_warn;

/// Deliver the mixed channel commands to the safety processor.
///
/// Losing the link is fatal. Any other failure drops this cycle's commands.
pub(crate) fn execute<P, S, Z>(context: &mut Context<P, S, Z>) -> StateId
where
    Z: SafetySink,
{
    match context.safety.send(&context.channels) {
        Ok(()) => StateId::FetchInstructions,
        Err(error) if error.is_link_loss() => context.fail(Fault::SafetyLinkLost),
        Err(error) => {
            context.dropped_cycles = context.dropped_cycles.wrapping_add(1);
            log_warn!(
                "dropped cycle ({} total): {}",
                context.dropped_cycles,
                error
            );
            StateId::FetchInstructions
        }
    }
}
