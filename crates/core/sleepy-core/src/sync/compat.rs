//! Model-checker compatibility shim.
//!
//! When compiled with `cfg(loom)` or `cfg(shuttle)`, re-exports that
//! checker's primitives. Otherwise, re-exports `std::sync`.
//!
//! The gate and the cancel token only ever name these paths, so they can
//! be explored under a deterministic scheduler without code changes.

use std::sync::{LockResult, PoisonError};

// ---------------------------------------------------------------------------
// Loom mode
// ---------------------------------------------------------------------------

#[cfg(loom)]
pub(crate) use loom::sync::atomic::{AtomicBool, AtomicU64, Ordering};
#[cfg(loom)]
pub(crate) use loom::sync::{Arc, Condvar, Mutex, MutexGuard};

// ---------------------------------------------------------------------------
// Shuttle mode
// ---------------------------------------------------------------------------

#[cfg(all(shuttle, not(loom)))]
pub(crate) use shuttle::sync::atomic::{AtomicBool, AtomicU64, Ordering};
#[cfg(all(shuttle, not(loom)))]
pub(crate) use shuttle::sync::{Arc, Condvar, Mutex, MutexGuard};

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

#[cfg(not(any(loom, shuttle)))]
pub(crate) use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
#[cfg(not(any(loom, shuttle)))]
pub(crate) use std::sync::{Arc, Condvar, Mutex, MutexGuard};

/// Unwraps a lock result, recovering the guard from a poisoned lock.
///
/// Every critical section in this crate leaves its state consistent before
/// anything can panic, so a poisoned lock still guards valid data.
#[inline]
pub(crate) fn recover<G>(result: LockResult<G>) -> G {
    result.unwrap_or_else(PoisonError::into_inner)
}
