//! # Worker Module Test Suite
//!
//! End-to-end tests over loopback TCP: real listeners, real worker threads,
//! std blocking clients.
//!
//! ## Test Categories:
//!
//! 1. **Spawn** - argument checks and address resolution
//! 2. **Echo** - byte fidelity for small and large payloads
//! 3. **Admission** - session limit and slot reuse
//! 4. **Shutdown** - idle sessions are closed

use super::*;
use std::io::{Read, Write};
use std::net::TcpStream;

fn test_config(workers: usize, max_sessions: usize) -> ReactorConfig {
    ReactorConfig {
        workers,
        poll_timeout_ms: 10,
        max_sessions_per_worker: max_sessions,
        ..ReactorConfig::default()
    }
}

fn start(workers: usize, max_sessions: usize) -> NetIoHandle {
    spawn(
        "127.0.0.1:0".parse().unwrap(),
        &NetworkConfig::default(),
        test_config(workers, max_sessions),
        TelemetryConfig::default(),
    )
    .expect("spawn workers")
}

fn connect(handle: &NetIoHandle) -> TcpStream {
    let stream = TcpStream::connect(handle.local_addr()).expect("connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    stream
}

fn echo(client: &mut TcpStream, payload: &[u8]) -> Vec<u8> {
    client.write_all(payload).unwrap();
    let mut back = vec![0u8; payload.len()];
    client.read_exact(&mut back).unwrap();
    back
}

// ============================================================================
// Spawn
// ============================================================================

#[test]
fn test_spawn_rejects_zero_workers() {
    let result = spawn(
        "127.0.0.1:0".parse().unwrap(),
        &NetworkConfig::default(),
        test_config(0, 8),
        TelemetryConfig::default(),
    );
    assert!(result.is_err());
}

#[test]
fn test_spawn_resolves_port_for_all_workers() {
    let handle = start(2, 8);
    assert_eq!(handle.worker_count(), 2);
    assert_ne!(handle.local_addr().port(), 0);
    handle.shutdown();
}

// ============================================================================
// Echo
// ============================================================================

#[test]
fn test_echo_roundtrip() {
    let handle = start(2, 8);

    let mut a = connect(&handle);
    let mut b = connect(&handle);
    assert_eq!(echo(&mut a, b"hello"), b"hello");
    assert_eq!(echo(&mut b, b"world"), b"world");
    assert_eq!(echo(&mut a, b"again"), b"again");

    drop(a);
    drop(b);
    let stats = handle.shutdown();
    assert_eq!(stats.accepted, 2);
    assert_eq!(stats.bytes_echoed, 15);
    assert_eq!(stats.errors, 0);
}

#[test]
fn test_large_payload_survives_back_pressure() {
    let handle = start(1, 8);
    let mut client = connect(&handle);

    let payload: Vec<u8> = (0..512 * 1024).map(|i| (i % 251) as u8).collect();
    assert_eq!(echo(&mut client, &payload), payload);

    drop(client);
    let stats = handle.shutdown();
    assert_eq!(stats.bytes_echoed, payload.len() as u64);
}

// ============================================================================
// Admission
// ============================================================================

#[test]
fn test_connections_over_limit_are_refused() {
    let handle = start(1, 1);

    let mut first = connect(&handle);
    assert_eq!(echo(&mut first, b"in"), b"in");

    let mut second = connect(&handle);
    let _ = second.write_all(b"x");
    let mut buf = [0u8; 1];
    let refused = matches!(second.read(&mut buf), Ok(0) | Err(_));
    assert!(refused, "second connection must be closed by the server");

    drop(first);
    drop(second);
    let stats = handle.shutdown();
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.refused, 1);
}

#[test]
fn test_slot_is_reused_after_disconnect() {
    let handle = start(1, 1);

    let mut first = connect(&handle);
    assert_eq!(echo(&mut first, b"one"), b"one");
    drop(first);

    // Let the worker observe the hangup before the next connection arrives.
    thread::sleep(Duration::from_millis(200));

    let mut second = connect(&handle);
    assert_eq!(echo(&mut second, b"two"), b"two");

    drop(second);
    let stats = handle.shutdown();
    assert_eq!(stats.accepted, 2);
    assert_eq!(stats.refused, 0);
    assert!(stats.hangups >= 1);
}

// ============================================================================
// Shutdown
// ============================================================================

#[test]
fn test_shutdown_closes_idle_sessions() {
    let handle = start(1, 8);
    let mut client = connect(&handle);
    assert_eq!(echo(&mut client, b"ok"), b"ok");

    let stats = handle.shutdown();
    assert_eq!(stats.closed, 1);

    let mut buf = [0u8; 1];
    assert_eq!(client.read(&mut buf).unwrap(), 0);
}
