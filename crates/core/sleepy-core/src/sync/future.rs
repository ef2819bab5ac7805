//! Async wait on a [`SignalGate`].

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use super::gate::SignalGate;

/// Future returned by [`SignalGate::wait_async`].
///
/// Resolves once it consumes a raised signal. The check and the waker
/// registration happen under the gate lock, so a raise between the two
/// cannot be missed. Each future parks its own queue entry, so futures
/// polled from the same task never share one.
#[must_use = "futures do nothing unless polled"]
pub struct SignalFuture<'a> {
    gate: &'a SignalGate,
    /// Waiter id and raise epoch, fixed at first poll.
    waiter: Option<Waiter>,
    done: bool,
}

#[derive(Clone, Copy)]
struct Waiter {
    id: u64,
    epoch: u64,
}

impl<'a> SignalFuture<'a> {
    pub(crate) fn new(gate: &'a SignalGate) -> Self {
        Self {
            gate,
            waiter: None,
            done: false,
        }
    }
}

impl Future for SignalFuture<'_> {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        // Polling past completion must not take a later raise.
        if self.done {
            return Poll::Ready(());
        }

        let gate = self.gate;
        let shared = gate.shared();
        let mut state = shared.lock();
        let waiter = *self.waiter.get_or_insert_with(|| Waiter {
            id: state.alloc_waiter(),
            epoch: state.epoch(),
        });

        if shared.try_observe(&mut state, waiter.epoch) {
            state.unpark(waiter.id);
            drop(state);
            self.done = true;
            return Poll::Ready(());
        }

        // A raise drains the queue, so re-park on every pending poll.
        state.park(waiter.id, cx.waker());
        Poll::Pending
    }
}

impl Drop for SignalFuture<'_> {
    fn drop(&mut self) {
        if let (Some(waiter), false) = (self.waiter, self.done) {
            self.gate.shared().lock().unpark(waiter.id);
        }
    }
}
