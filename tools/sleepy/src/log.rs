//! Log output for the sleepy tool.
//!
//! Three levels controlled by CLI flags:
//! - **Quiet** (`-q`): warnings and errors only
//! - **Default** (no flag): info
//! - **Verbose** (`-v`): debug, including every sleep and wake in the device
//!
//! `RUST_LOG` takes precedence over the flags when set.

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber for the current process.
pub fn init(quiet: bool, verbose: bool) {
    let level = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .init();
}
