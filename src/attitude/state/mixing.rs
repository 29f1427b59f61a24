use crate::attitude::{Context, StateId};
use crate::error::Fault;

/// Mix the control outputs into actuator channel commands.
pub(crate) fn execute<P, S, Z>(context: &mut Context<P, S, Z>) -> StateId {
    let mixer = &context.config.mixer;
    let channels = mixer.mix(&context.pid_output);

    match mixer.check(&channels) {
        Ok(()) => {
            context.channels = channels;
            StateId::SendToSafety
        }
        Err(error) => context.fail(Fault::ChannelOutOfRange {
            channel: error.channel,
            value: error.value,
        }),
    }
}
