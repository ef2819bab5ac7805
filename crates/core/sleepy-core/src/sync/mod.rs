//! Synchronization core: the [`SignalGate`] and its cancellation token.
//!
//! Provides the blocking wait ([`SignalGate::await_signal`]), the async
//! wait ([`SignalFuture`]) and the broadcast wake
//! ([`SignalGate::raise_signal`]). Nothing outside this module touches the
//! gate's condition.

mod cancel;
mod future;
mod gate;

pub(crate) mod compat;

#[cfg(test)]
pub(crate) mod test_waker;

pub use cancel::CancelToken;
pub use future::SignalFuture;
pub use gate::{ConsumePolicy, GateStats, ParsePolicyError, SignalGate, WaitOutcome};
