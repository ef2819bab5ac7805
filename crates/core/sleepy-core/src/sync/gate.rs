//! The signal gate: one latched condition plus the callers sleeping on it.
//!
//! [`SignalGate`] lets readers sleep until a writer raises the signal.
//! Raising latches the condition and wakes every sleeper (broadcast);
//! a successful wait resets it. Waits are interruptible through a
//! [`CancelToken`].
//!
//! # Example
//!
//! ```ignore
//! let gate = SignalGate::new(ConsumePolicy::Broadcast);
//!
//! // Reader:
//! match gate.await_signal(&token) {
//!     WaitOutcome::Consumed => { /* event seen */ }
//!     WaitOutcome::Interrupted => { /* token was cancelled */ }
//! }
//!
//! // Writer:
//! gate.raise_signal();
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use std::task::Waker;

use serde::Deserialize;

use super::cancel::CancelToken;
use super::compat::{Arc, Condvar, Mutex, MutexGuard, recover};
use super::future::SignalFuture;

/// Result of [`SignalGate::await_signal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum WaitOutcome {
    /// A raised signal was observed and consumed.
    Consumed,
    /// The wait was aborted by a cancellation request. The condition was
    /// left untouched.
    Interrupted,
}

/// How many woken waiters one raise can satisfy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsumePolicy {
    /// Every waiter that was asleep when a raise fired and is woken by it
    /// returns [`WaitOutcome::Consumed`], even when another woken waiter
    /// already reset the condition.
    #[default]
    Broadcast,
    /// Each raise is consumed by exactly one caller. Waiters that lose the
    /// race go back to sleep.
    Exclusive,
}

impl ConsumePolicy {
    /// Returns the lowercase name used in config files and on the command line.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Broadcast => "broadcast",
            Self::Exclusive => "exclusive",
        }
    }
}

impl fmt::Display for ConsumePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a [`ConsumePolicy`] name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown consume policy '{0}' (expected 'broadcast' or 'exclusive')")]
pub struct ParsePolicyError(String);

impl FromStr for ConsumePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "broadcast" => Ok(Self::Broadcast),
            "exclusive" => Ok(Self::Exclusive),
            _ => Err(ParsePolicyError(s.to_owned())),
        }
    }
}

/// Point-in-time view of a gate's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateStats {
    /// Whether a raised signal is waiting to be consumed.
    pub pending: bool,
    /// Total number of raises.
    pub raises: u64,
    /// Total number of successful consumes (blocking, async and non-blocking).
    pub consumed: u64,
    /// Total number of waits aborted by cancellation.
    pub interrupted: u64,
    /// Callers currently asleep: blocked threads plus parked tasks.
    pub sleepers: usize,
}

/// State guarded by the gate lock.
pub(crate) struct GateState {
    condition: bool,
    /// Raise epoch. A sleeper compares it against the value it saw when it
    /// went to sleep to learn that a raise fired in between.
    raises: u64,
    consumed: u64,
    interrupted: u64,
    blocked: usize,
    /// Parked async waiters, one entry per future, keyed by waiter id.
    wakers: VecDeque<(u64, Waker)>,
    next_waiter: u64,
}

/// Shared part of a [`SignalGate`]; also reachable from cancel tokens.
pub(crate) struct GateShared {
    state: Mutex<GateState>,
    sleepers: Condvar,
    policy: ConsumePolicy,
}

impl GateShared {
    pub(crate) fn lock(&self) -> MutexGuard<'_, GateState> {
        recover(self.state.lock())
    }

    /// Wakes every blocked thread so it re-checks its wait predicate.
    ///
    /// Takes the gate lock so the wake cannot slip in between a sleeper's
    /// check and its suspend.
    pub(crate) fn wake_sleepers(&self) {
        let _state = self.lock();
        self.sleepers.notify_all();
    }

    /// Consumes the signal on behalf of a caller that went to sleep at `epoch`.
    ///
    /// Returns `true` if the caller may report success.
    pub(crate) fn try_observe(&self, state: &mut GateState, epoch: u64) -> bool {
        let observed = match self.policy {
            ConsumePolicy::Broadcast => state.condition || state.raises != epoch,
            ConsumePolicy::Exclusive => state.condition,
        };
        if observed {
            state.condition = false;
            state.consumed += 1;
        }
        observed
    }
}

impl GateState {
    pub(crate) fn epoch(&self) -> u64 {
        self.raises
    }

    /// Hands out an id for a new async waiter.
    pub(crate) fn alloc_waiter(&mut self) -> u64 {
        let id = self.next_waiter;
        self.next_waiter += 1;
        id
    }

    /// Parks `waker` under `id`, replacing that waiter's previous entry.
    pub(crate) fn park(&mut self, id: u64, waker: &Waker) {
        match self.wakers.iter_mut().find(|(entry, _)| *entry == id) {
            Some((_, parked)) => {
                if !parked.will_wake(waker) {
                    parked.clone_from(waker);
                }
            }
            None => self.wakers.push_back((id, waker.clone())),
        }
    }

    /// Removes the entry parked under `id`, if a raise has not drained it.
    pub(crate) fn unpark(&mut self, id: u64) {
        if let Some(pos) = self.wakers.iter().position(|(entry, _)| *entry == id) {
            self.wakers.remove(pos);
        }
    }
}

/// A latched boolean condition with a broadcast wake.
///
/// Cloning a `SignalGate` yields another handle to the same gate. Construct
/// one per device at startup and hand clones to every reader and writer.
#[derive(Clone)]
pub struct SignalGate {
    shared: Arc<GateShared>,
}

impl SignalGate {
    /// Creates an idle gate.
    pub fn new(policy: ConsumePolicy) -> Self {
        Self {
            shared: Arc::new(GateShared {
                state: Mutex::new(GateState {
                    condition: false,
                    raises: 0,
                    consumed: 0,
                    interrupted: 0,
                    blocked: 0,
                    wakers: VecDeque::new(),
                    next_waiter: 0,
                }),
                sleepers: Condvar::new(),
                policy,
            }),
        }
    }

    /// Returns the consume policy chosen at construction.
    pub fn policy(&self) -> ConsumePolicy {
        self.shared.policy
    }

    /// Sleeps until the signal is raised, then consumes it.
    ///
    /// Returns [`WaitOutcome::Interrupted`] if `token` is cancelled first.
    /// A signal that is already pending is consumed without sleeping, even
    /// when the token is already cancelled.
    pub fn await_signal(&self, token: &CancelToken) -> WaitOutcome {
        let shared = &self.shared;
        let mut state = shared.lock();
        let epoch = state.raises;

        if shared.try_observe(&mut state, epoch) {
            return WaitOutcome::Consumed;
        }

        let _registration = token.register(shared);
        state.blocked += 1;
        let outcome = loop {
            if token.is_cancelled() {
                state.interrupted += 1;
                break WaitOutcome::Interrupted;
            }
            state = recover(shared.sleepers.wait(state));
            if shared.try_observe(&mut state, epoch) {
                break WaitOutcome::Consumed;
            }
        };
        state.blocked -= 1;
        outcome
    }

    /// Returns a future that resolves once it consumes a raised signal.
    ///
    /// Dropping the future before it resolves abandons the wait and leaves
    /// the condition untouched.
    pub fn wait_async(&self) -> SignalFuture<'_> {
        SignalFuture::new(self)
    }

    /// Latches the condition and wakes every sleeper.
    ///
    /// Never blocks beyond the gate lock. Raising an already-raised gate
    /// changes nothing but the raise count.
    pub fn raise_signal(&self) {
        let wakers = {
            let mut state = self.shared.lock();
            state.condition = true;
            state.raises += 1;
            self.shared.sleepers.notify_all();
            core::mem::take(&mut state.wakers)
        };
        for (_, waker) in wakers {
            waker.wake();
        }
    }

    /// Consumes a pending signal without sleeping.
    ///
    /// Returns `false` if nothing was pending.
    pub fn try_consume(&self) -> bool {
        let mut state = self.shared.lock();
        let epoch = state.raises;
        self.shared.try_observe(&mut state, epoch)
    }

    /// Returns `true` if a raised signal has not been consumed yet.
    pub fn is_pending(&self) -> bool {
        self.shared.lock().condition
    }

    /// Returns a snapshot of the gate's counters.
    pub fn stats(&self) -> GateStats {
        let state = self.shared.lock();
        GateStats {
            pending: state.condition,
            raises: state.raises,
            consumed: state.consumed,
            interrupted: state.interrupted,
            sleepers: state.blocked + state.wakers.len(),
        }
    }

    pub(crate) fn shared(&self) -> &Arc<GateShared> {
        &self.shared
    }
}

impl fmt::Debug for SignalGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalGate")
            .field("policy", &self.shared.policy)
            .field("stats", &self.stats())
            .finish()
    }
}
