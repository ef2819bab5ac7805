//! Cancellation requests for interruptible waits.
//!
//! A [`CancelToken`] plays the role of a pending signal on the calling
//! task: once cancelled, any [`SignalGate::await_signal`] the owner is
//! sleeping in returns [`WaitOutcome::Interrupted`].
//!
//! [`SignalGate::await_signal`]: super::SignalGate::await_signal
//! [`WaitOutcome::Interrupted`]: super::WaitOutcome::Interrupted

use super::compat::{Arc, AtomicBool, AtomicU64, Mutex, Ordering, recover};
use super::gate::GateShared;

/// A cloneable, sticky cancellation request.
///
/// All clones share the same flag. Cancelling wakes whichever gates the
/// token's owners are currently sleeping on, so the waits can observe the
/// request without polling.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

struct TokenInner {
    cancelled: AtomicBool,
    next_id: AtomicU64,
    /// Gates an owner of this token is sleeping on, keyed by registration id.
    sleeping_on: Mutex<Vec<(u64, Arc<GateShared>)>>,
}

impl CancelToken {
    /// Creates a token that has not been cancelled.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TokenInner {
                cancelled: AtomicBool::new(false),
                next_id: AtomicU64::new(0),
                sleeping_on: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Requests cancellation and wakes any wait using this token.
    ///
    /// Safe to call from any thread, any number of times.
    pub fn cancel(&self) {
        // The flag must be visible before the registrations are read:
        // a waiter registers first and checks the flag second.
        self.inner.cancelled.store(true, Ordering::SeqCst);

        let gates: Vec<Arc<GateShared>> = recover(self.inner.sleeping_on.lock())
            .iter()
            .map(|(_, gate)| Arc::clone(gate))
            .collect();

        for gate in gates {
            gate.wake_sleepers();
        }
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Records that an owner is about to sleep on `gate`.
    ///
    /// The registration is removed when the returned guard drops. Must be
    /// called before the first cancellation check of the wait.
    pub(crate) fn register(&self, gate: &Arc<GateShared>) -> Registration<'_> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        recover(self.inner.sleeping_on.lock()).push((id, Arc::clone(gate)));
        Registration { token: self, id }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Removes a gate registration from its token on drop.
pub(crate) struct Registration<'a> {
    token: &'a CancelToken,
    id: u64,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        let mut sleeping_on = recover(self.token.inner.sleeping_on.lock());
        if let Some(pos) = sleeping_on.iter().position(|(id, _)| *id == self.id) {
            sleeping_on.swap_remove(pos);
        }
    }
}
