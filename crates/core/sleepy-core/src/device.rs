//! Character-device shim over a [`SignalGate`].
//!
//! Reading from a [`DeviceHandle`] puts the caller to sleep until someone
//! writes; writing wakes every sleeping reader. No data is transferred in
//! either direction: reads return end-of-file and writes swallow their
//! input whole.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use bitflags::bitflags;
use tracing::debug;

use crate::config::DeviceConfig;
use crate::sync::{CancelToken, SignalGate, WaitOutcome};

/// Linux `EAGAIN`.
pub const EAGAIN: i32 = 11;
/// Linux `ERESTARTSYS`: the call was interrupted by a signal and may be
/// restarted transparently.
pub const ERESTARTSYS: i32 = 512;

bitflags! {
    /// Flags passed to [`SleepyDevice::open`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OpenFlags: u32 {
        /// Reads fail with [`DeviceError::WouldBlock`] instead of sleeping.
        const NONBLOCK = 0o4000;
    }
}

/// Errors surfaced by device reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// The sleep was aborted by a cancellation request.
    #[error("operation aborted by request")]
    Interrupted,
    /// Nothing is pending and the handle is non-blocking.
    #[error("operation would block")]
    WouldBlock,
}

impl DeviceError {
    /// Returns the errno a kernel driver would report.
    pub const fn errno(self) -> i32 {
        match self {
            Self::Interrupted => ERESTARTSYS,
            Self::WouldBlock => EAGAIN,
        }
    }
}

/// A device that owns one gate and hands out handles to it.
#[derive(Debug)]
pub struct SleepyDevice {
    name: Arc<str>,
    gate: SignalGate,
    next_pid: AtomicU32,
}

impl SleepyDevice {
    /// Creates a device with an idle gate.
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            name: Arc::from(config.name),
            gate: SignalGate::new(config.policy),
            next_pid: AtomicU32::new(1),
        }
    }

    /// Returns the device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the gate behind this device.
    pub fn gate(&self) -> &SignalGate {
        &self.gate
    }

    /// Opens a handle for the calling thread.
    ///
    /// The handle takes its name from the current thread and gets a fresh
    /// id and cancel token.
    pub fn open(&self, flags: OpenFlags) -> DeviceHandle {
        let pid = self.next_pid.fetch_add(1, Ordering::Relaxed);
        let comm = std::thread::current()
            .name()
            .unwrap_or("unnamed")
            .to_owned();
        DeviceHandle {
            device: Arc::clone(&self.name),
            gate: self.gate.clone(),
            flags,
            token: CancelToken::new(),
            pid,
            comm,
        }
    }
}

/// An open handle on a [`SleepyDevice`].
#[derive(Debug)]
pub struct DeviceHandle {
    device: Arc<str>,
    gate: SignalGate,
    flags: OpenFlags,
    token: CancelToken,
    pid: u32,
    comm: String,
}

impl DeviceHandle {
    /// Waits for a write, then returns end-of-file.
    ///
    /// `buf` is never written to. Blocking handles sleep until a write or
    /// until [`cancel_token`](Self::cancel_token) is cancelled.
    pub fn read(&self, _buf: &mut [u8]) -> Result<usize, DeviceError> {
        if self.flags.contains(OpenFlags::NONBLOCK) {
            return if self.gate.try_consume() {
                Ok(0)
            } else {
                Err(DeviceError::WouldBlock)
            };
        }

        debug!(device = %self.device, pid = self.pid, comm = %self.comm, "going to sleep");
        match self.gate.await_signal(&self.token) {
            WaitOutcome::Consumed => {
                debug!(device = %self.device, pid = self.pid, comm = %self.comm, "awoken");
                Ok(0)
            }
            WaitOutcome::Interrupted => {
                debug!(device = %self.device, pid = self.pid, comm = %self.comm, "sleep interrupted");
                Err(DeviceError::Interrupted)
            }
        }
    }

    /// Wakes every sleeping reader and reports the whole buffer as written.
    ///
    /// Claiming the full count keeps callers from retrying the write.
    pub fn write(&self, buf: &[u8]) -> Result<usize, DeviceError> {
        debug!(
            device = %self.device,
            pid = self.pid,
            comm = %self.comm,
            "awakening the readers"
        );
        self.gate.raise_signal();
        Ok(buf.len())
    }

    /// Returns the token that interrupts this handle's reads.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.token
    }

    /// Returns the flags the handle was opened with.
    pub fn flags(&self) -> OpenFlags {
        self.flags
    }

    /// Returns the id assigned at open time.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Returns the name of the thread that opened the handle.
    pub fn comm(&self) -> &str {
        &self.comm
    }
}
