//! Library side of the sleepy tool.
//!
//! The binary in `main.rs` only parses flags and dispatches; the scripted
//! runs live here so they can be driven from integration tests.

pub mod cli;
pub mod log;
pub mod run;
