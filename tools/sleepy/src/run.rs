//! Scripted reader/writer runs against a shared device.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};
use sleepy_core::{CancelToken, DeviceError, GateStats, OpenFlags, SignalGate, SleepyDevice};
use tracing::info;

use crate::cli::{DemoArgs, InterruptArgs};

/// How long readers get to fall asleep before a run gives up.
const SLEEP_DEADLINE: Duration = Duration::from_secs(5);

/// What a reader thread reports back.
struct ReaderReport {
    pid: u32,
    result: Result<usize, DeviceError>,
    slept: Duration,
}

/// Spawns a named reader thread that opens a blocking handle and reads once.
///
/// The handle's cancel token is sent on `tokens` before the thread sleeps.
fn spawn_reader(
    device: &Arc<SleepyDevice>,
    name: String,
    tokens: mpsc::Sender<CancelToken>,
) -> Result<JoinHandle<ReaderReport>> {
    let device = Arc::clone(device);
    thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            let handle = device.open(OpenFlags::empty());
            let _ = tokens.send(handle.cancel_token().clone());
            let start = Instant::now();
            let result = handle.read(&mut [0u8; 1]);
            ReaderReport {
                pid: handle.pid(),
                result,
                slept: start.elapsed(),
            }
        })
        .with_context(|| format!("failed to spawn {name}"))
}

/// Blocks until `n` callers are asleep on `gate`.
fn wait_for_sleepers(gate: &SignalGate, n: usize) -> Result<()> {
    let start = Instant::now();
    while gate.stats().sleepers < n {
        if start.elapsed() > SLEEP_DEADLINE {
            bail!(
                "only {} of {n} readers fell asleep within {SLEEP_DEADLINE:?}",
                gate.stats().sleepers
            );
        }
        thread::sleep(Duration::from_millis(1));
    }
    Ok(())
}

fn join_reader(name: &str, reader: JoinHandle<ReaderReport>) -> Result<ReaderReport> {
    reader.join().map_err(|_| anyhow!("{name} panicked"))
}

fn print_report(name: &str, report: &ReaderReport) {
    match report.result {
        Ok(_) => println!(
            "  {name} (pid {}): woken after {:.1?}",
            report.pid, report.slept
        ),
        Err(err) => println!(
            "  {name} (pid {}): {err} after {:.1?} (errno {})",
            report.pid,
            report.slept,
            err.errno()
        ),
    }
}

fn print_stats(stats: &GateStats) {
    println!(
        "\nGate: {} raise(s), {} consume(s), {} interrupted, pending = {}",
        stats.raises, stats.consumed, stats.interrupted, stats.pending
    );
}

/// Puts readers to sleep, wakes them with writes, cancels the leftovers.
pub fn cmd_demo(device: &Arc<SleepyDevice>, args: &DemoArgs) -> Result<()> {
    let interval = Duration::from_millis(args.interval_ms);
    println!(
        "Device '{}' ({} policy): {} reader(s), {} write(s)",
        device.name(),
        device.gate().policy(),
        args.readers,
        args.writes
    );

    let (token_tx, token_rx) = mpsc::channel();
    let mut readers = Vec::with_capacity(args.readers);
    for i in 0..args.readers {
        let name = format!("reader-{i}");
        readers.push((name.clone(), spawn_reader(device, name, token_tx.clone())?));
    }
    drop(token_tx);

    let tokens: Vec<CancelToken> = token_rx.iter().take(args.readers).collect();
    wait_for_sleepers(device.gate(), args.readers)?;
    info!(readers = args.readers, "all readers asleep");

    let writer = device.open(OpenFlags::empty());
    for n in 1..=args.writes {
        thread::sleep(interval);
        writer.write(b"wake")?;
        info!(write = n, "awakened the readers");
    }

    thread::sleep(interval);
    let leftover = device.gate().stats().sleepers;
    if leftover > 0 {
        info!(leftover, "interrupting readers still asleep");
    }
    for token in &tokens {
        token.cancel();
    }

    println!("\nReaders:");
    for (name, reader) in readers {
        let report = join_reader(&name, reader)?;
        print_report(&name, &report);
    }
    print_stats(&device.gate().stats());
    Ok(())
}

/// Interrupts a sleeping reader, then shows a later write still gets through.
pub fn cmd_interrupt(device: &Arc<SleepyDevice>, args: &InterruptArgs) -> Result<()> {
    let (token_tx, token_rx) = mpsc::channel();

    let first = spawn_reader(device, "reader-0".into(), token_tx.clone())?;
    let token = token_rx
        .recv()
        .context("reader-0 exited before it could be interrupted")?;
    wait_for_sleepers(device.gate(), 1)?;

    thread::sleep(Duration::from_millis(args.delay_ms));
    info!("interrupting reader-0");
    token.cancel();
    let report = join_reader("reader-0", first)?;
    print_report("reader-0", &report);
    if report.result != Err(DeviceError::Interrupted) {
        bail!("reader-0 was not interrupted");
    }

    device.open(OpenFlags::empty()).write(b"wake")?;
    info!("signal latched with no readers asleep");

    let second = spawn_reader(device, "reader-1".into(), token_tx)?;
    let report = join_reader("reader-1", second)?;
    print_report("reader-1", &report);
    if report.result.is_err() {
        bail!("reader-1 did not consume the latched signal");
    }

    print_stats(&device.gate().stats());
    Ok(())
}
