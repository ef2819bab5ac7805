//! Signal gate and the device shim built on top of it.
//!
//! A [`SignalGate`] holds one boolean condition and the set of callers
//! sleeping on it. Writers call [`SignalGate::raise_signal`] to latch the
//! condition and wake every sleeper; readers call
//! [`SignalGate::await_signal`] to sleep until the condition is set and then
//! consume it. No payload crosses the gate: the only thing conveyed is
//! "an event occurred".
//!
//! [`device::SleepyDevice`] maps byte-oriented read/write calls onto the
//! gate the way a character device would, and [`config::DeviceConfig`]
//! describes how a device is set up.
//!
//! All concurrency primitives go through [`sync`]'s compat layer so the
//! same code runs under `loom` and `shuttle`.

pub mod config;
pub mod device;
pub mod sync;

pub use config::{ConfigError, DeviceConfig};
pub use device::{DeviceError, DeviceHandle, OpenFlags, SleepyDevice};
pub use sync::{
    CancelToken, ConsumePolicy, GateStats, ParsePolicyError, SignalFuture, SignalGate, WaitOutcome,
};
