use super::Context;

pub(crate) mod fatal;
pub(crate) mod fetch;
pub(crate) mod fusion;
pub(crate) mod mixing;
pub(crate) mod pid_loop;
pub(crate) mod send;

/// Enter or exit behavior of a state with nothing to do.
pub(crate) fn none<P, S, Z>(_context: &mut Context<P, S, Z>) {}
