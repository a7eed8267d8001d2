//! TCP listener creation with SO_REUSEPORT for per-worker accept loops.
//!
//! Every worker binds its own listener to the same address; with
//! SO_REUSEPORT the kernel distributes incoming connections across them, so
//! workers never share an accept queue.

use crate::config::global::NetworkConfig;
use crate::netio::config::ReactorConfig;
use anyhow::{Context, Result};
use socket2::{Domain, Protocol, SockRef, Socket as Socket2, Type};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::os::fd::AsRawFd;

/// Create and configure a non-blocking TCP listener.
///
/// This function:
/// 1. Creates a TCP socket using socket2
/// 2. Configures SO_REUSEADDR and SO_REUSEPORT
/// 3. Binds to the specified address and starts listening
/// 4. Switches the listener to non-blocking mode for the poll reactor
///
/// # Arguments
///
/// * `bind_addr` - Address to bind the listener to
/// * `network` - Binding options (address reuse, backlog)
/// * `reactor` - Worker options (port reuse)
pub fn create_tcp_listener(
    bind_addr: SocketAddr,
    network: &NetworkConfig,
    reactor: &ReactorConfig,
) -> Result<TcpListener> {
    let domain = match bind_addr {
        SocketAddr::V4(_) => Domain::IPV4,
        SocketAddr::V6(_) => Domain::IPV6,
    };

    let socket =
        Socket2::new(domain, Type::STREAM, Some(Protocol::TCP)).context("creating TCP socket")?;

    socket
        .set_reuse_address(network.reuse_addr)
        .context("setting SO_REUSEADDR")?;

    if reactor.reuse_port {
        configure_reuse_port(&socket).context("setting SO_REUSEPORT")?;
    }

    // For IPv6, configure v6-only based on bind address
    if let SocketAddr::V6(addr) = bind_addr {
        socket
            .set_only_v6(!addr.ip().is_unspecified())
            .context("setting IPV6_V6ONLY")?;
    }

    socket
        .bind(&bind_addr.into())
        .with_context(|| format!("binding TCP listener to {}", bind_addr))?;

    socket
        .listen(network.backlog)
        .with_context(|| format!("listening with backlog {}", network.backlog))?;

    socket
        .set_nonblocking(true)
        .context("setting listener non-blocking")?;

    Ok(socket.into())
}

/// Apply per-connection socket options to an accepted connection.
pub fn configure_accepted(stream: &TcpStream, config: &ReactorConfig) -> std::io::Result<()> {
    let socket = SockRef::from(stream);
    socket.set_nodelay(true)?;

    if let Some(size) = config.socket_recv_buffer_size {
        socket.set_recv_buffer_size(size)?;
    }

    if let Some(size) = config.socket_send_buffer_size {
        socket.set_send_buffer_size(size)?;
    }

    Ok(())
}

/// Configure SO_REUSEPORT on supported platforms.
///
/// # Platform Support
///
/// - Linux: Full support (since kernel 3.9)
/// - BSD/macOS: Supported
#[cfg(any(
    target_os = "android",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "linux",
    target_os = "macos",
    target_os = "netbsd",
    target_os = "openbsd",
))]
fn configure_reuse_port(socket: &Socket2) -> std::io::Result<()> {
    use std::mem::size_of_val;

    let value: libc::c_int = 1;
    let ret = unsafe {
        libc::setsockopt(
            socket.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_REUSEPORT,
            &value as *const _ as *const libc::c_void,
            size_of_val(&value) as libc::socklen_t,
        )
    };

    if ret == -1 {
        let err = std::io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::ENOPROTOOPT) | Some(libc::EINVAL) => {
                tracing::warn!("SO_REUSEPORT not supported on this platform");
                Ok(())
            }
            _ => Err(err),
        }
    } else {
        Ok(())
    }
}

#[cfg(not(any(
    target_os = "android",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "linux",
    target_os = "macos",
    target_os = "netbsd",
    target_os = "openbsd",
)))]
fn configure_reuse_port(_socket: &Socket2) -> std::io::Result<()> {
    tracing::warn!("SO_REUSEPORT not available on this platform");
    Ok(())
}
