//! Tests for listener creation and reactor configuration.

use super::config::*;
use super::socket::{configure_accepted, create_tcp_listener};
use crate::config::global::NetworkConfig;
use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream};

fn loopback() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

// =============================================================================
// Listener creation
// =============================================================================

#[test]
fn test_listener_is_nonblocking() {
    let listener =
        create_tcp_listener(loopback(), &NetworkConfig::default(), &ReactorConfig::default())
            .unwrap();

    let err = listener.accept().unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
}

#[test]
fn test_listener_accepts_connections() {
    let listener =
        create_tcp_listener(loopback(), &NetworkConfig::default(), &ReactorConfig::default())
            .unwrap();
    let addr = listener.local_addr().unwrap();

    let mut client = TcpStream::connect(addr).unwrap();
    client.write_all(b"hi").unwrap();

    // The connection is queued by the kernel; poll until it shows up.
    let mut accepted = None;
    for _ in 0..100 {
        match listener.accept() {
            Ok((stream, _)) => {
                accepted = Some(stream);
                break;
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                std::thread::sleep(std::time::Duration::from_millis(10));
            }
            Err(e) => panic!("accept failed: {}", e),
        }
    }
    let accepted = accepted.expect("connection accepted");
    configure_accepted(&accepted, &ReactorConfig::default()).unwrap();
}

#[test]
fn test_reuse_port_allows_shared_bind() {
    let network = NetworkConfig::default();
    let reactor = ReactorConfig {
        reuse_port: true,
        ..ReactorConfig::default()
    };

    let first = create_tcp_listener(loopback(), &network, &reactor).unwrap();
    let addr = first.local_addr().unwrap();
    let second = create_tcp_listener(addr, &network, &reactor).unwrap();

    assert_eq!(second.local_addr().unwrap(), addr);
}

#[test]
fn test_shared_bind_without_reuse_port_fails() {
    let network = NetworkConfig::default();
    let reactor = ReactorConfig {
        reuse_port: false,
        ..ReactorConfig::default()
    };

    let first = create_tcp_listener(loopback(), &network, &reactor).unwrap();
    let addr = first.local_addr().unwrap();

    assert!(create_tcp_listener(addr, &network, &reactor).is_err());
}

#[test]
fn test_accepted_socket_buffer_sizes() {
    let listener =
        create_tcp_listener(loopback(), &NetworkConfig::default(), &ReactorConfig::default())
            .unwrap();
    let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();

    let config = ReactorConfig {
        socket_recv_buffer_size: Some(64 * 1024),
        socket_send_buffer_size: Some(64 * 1024),
        ..ReactorConfig::default()
    };
    configure_accepted(&client, &config).unwrap();
    assert!(client.nodelay().unwrap());
}

// =============================================================================
// ReactorConfig
// =============================================================================

#[test]
fn test_reactor_config_default() {
    let config = ReactorConfig::default();
    assert!(config.workers >= 1);
    assert_eq!(config.poll_timeout_ms, DEFAULT_POLL_TIMEOUT_MS);
    assert_eq!(config.max_sessions_per_worker, DEFAULT_MAX_SESSIONS_PER_WORKER);
    assert!(config.reuse_port);
    assert!(config.validate().is_ok());
}

#[test]
fn test_reactor_config_zero_workers() {
    let config = ReactorConfig {
        workers: 0,
        ..ReactorConfig::default()
    };
    let errors = config.validate().unwrap_err();
    assert!(errors.iter().any(|e| e.contains("workers must be > 0")));
}

#[test]
fn test_reactor_config_multiple_workers_need_reuse_port() {
    let config = ReactorConfig {
        workers: 4,
        reuse_port: false,
        ..ReactorConfig::default()
    };
    let errors = config.validate().unwrap_err();
    assert!(errors.iter().any(|e| e.contains("reuse_port")));

    let single = ReactorConfig {
        workers: 1,
        reuse_port: false,
        ..ReactorConfig::default()
    };
    assert!(single.validate().is_ok());
}

#[test]
fn test_reactor_config_rejects_zero_limits() {
    let config = ReactorConfig {
        poll_timeout_ms: 0,
        max_sessions_per_worker: 0,
        socket_recv_buffer_size: Some(0),
        ..ReactorConfig::default()
    };
    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 3);
}

#[test]
fn test_reactor_config_partial_toml_uses_defaults() {
    let config: ReactorConfig = toml::from_str("workers = 2").unwrap();
    assert_eq!(config.workers, 2);
    assert_eq!(config.poll_timeout_ms, DEFAULT_POLL_TIMEOUT_MS);
    assert_eq!(config.socket_send_buffer_size, None);
}
