//! End-to-end read/write through the device shim.

#![cfg(not(any(loom, shuttle)))]
#![allow(missing_docs)] // integration test

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use sleepy_core::{ConsumePolicy, DeviceConfig, DeviceError, OpenFlags, SleepyDevice};

const DEADLINE: Duration = Duration::from_secs(5);

fn device(policy: ConsumePolicy) -> Arc<SleepyDevice> {
    Arc::new(SleepyDevice::new(DeviceConfig {
        name: "sleepy".into(),
        policy,
    }))
}

fn wait_for_sleepers(dev: &SleepyDevice, n: usize) {
    let start = Instant::now();
    while dev.gate().stats().sleepers != n {
        assert!(start.elapsed() < DEADLINE, "readers never went to sleep");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn write_wakes_sleeping_reader_with_eof() {
    let dev = device(ConsumePolicy::Broadcast);
    let (tx, rx) = mpsc::channel();
    let reader_dev = Arc::clone(&dev);
    thread::spawn(move || {
        let handle = reader_dev.open(OpenFlags::empty());
        let mut buf = [0u8; 16];
        let _ = tx.send(handle.read(&mut buf));
    });
    wait_for_sleepers(&dev, 1);

    let writer = dev.open(OpenFlags::empty());
    assert_eq!(writer.write(b"hello"), Ok(5));
    assert_eq!(rx.recv_timeout(DEADLINE), Ok(Ok(0)));
}

#[test]
fn one_write_wakes_all_readers() {
    let dev = device(ConsumePolicy::Broadcast);
    let (tx, rx) = mpsc::channel();
    for _ in 0..3 {
        let reader_dev = Arc::clone(&dev);
        let tx = tx.clone();
        thread::spawn(move || {
            let _ = tx.send(reader_dev.open(OpenFlags::empty()).read(&mut []));
        });
    }
    drop(tx);
    wait_for_sleepers(&dev, 3);

    dev.open(OpenFlags::empty()).write(b"!").unwrap();
    for _ in 0..3 {
        assert_eq!(rx.recv_timeout(DEADLINE), Ok(Ok(0)));
    }
}

#[test]
fn cancelled_reader_gets_interrupted() {
    let dev = device(ConsumePolicy::Exclusive);
    let handle = Arc::new(dev.open(OpenFlags::empty()));
    let (tx, rx) = mpsc::channel();
    let reader = Arc::clone(&handle);
    thread::spawn(move || {
        let _ = tx.send(reader.read(&mut []));
    });
    wait_for_sleepers(&dev, 1);

    handle.cancel_token().cancel();
    assert_eq!(
        rx.recv_timeout(DEADLINE),
        Ok(Err(DeviceError::Interrupted))
    );
    assert!(!dev.gate().is_pending());

    // A fresh handle still sees the next write.
    dev.open(OpenFlags::empty()).write(b"x").unwrap();
    assert_eq!(dev.open(OpenFlags::empty()).read(&mut []), Ok(0));
}

#[test]
fn nonblocking_reader_polls_until_written() {
    let dev = device(ConsumePolicy::Exclusive);
    let reader = dev.open(OpenFlags::NONBLOCK);
    assert_eq!(reader.read(&mut []), Err(DeviceError::WouldBlock));

    dev.open(OpenFlags::empty()).write(b"x").unwrap();
    assert_eq!(reader.read(&mut []), Ok(0));
    assert_eq!(reader.read(&mut []), Err(DeviceError::WouldBlock));
}
