//! Worker thread orchestration module.
//!
//! This module handles the spawning and lifecycle management of worker threads.
//! Each worker is a native OS thread with its own event loop and resources:
//! - **Own poll reactor** (no shared registration table)
//! - **Own TCP listener** bound with SO_REUSEPORT
//! - **Own session table and counters**
//!
//! Streams are single-threaded, so nothing inside a worker is shared with
//! other threads. The only cross-thread state is the shutdown flag.

mod acceptor;
pub mod echo;

#[cfg(test)]
mod tests;

pub use echo::{EchoSession, SessionTable, WorkerStats};

use crate::config::global::NetworkConfig;
use crate::netio::{create_tcp_listener, ReactorConfig};
use crate::reactor::PollReactor;
use crate::telemetry::TelemetryConfig;
use acceptor::Acceptor;
use anyhow::{Context, Result};
use reactd_stream::{Interest, InterestHandle, Multiplexer};
use std::cell::RefCell;
use std::net::{SocketAddr, TcpListener};
use std::os::fd::AsRawFd;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn};

/// How long a stopping worker keeps polling so closing sessions can drain.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Echo worker running in its own native thread.
pub struct EchoWorker {
    id: usize,
    listener: TcpListener,
    local_addr: SocketAddr,
    config: ReactorConfig,
    telemetry: TelemetryConfig,
    shutdown: Arc<AtomicBool>,
}

impl EchoWorker {
    /// Create a worker and bind its listener (called from main thread, then
    /// moved to the worker thread).
    pub fn new(
        id: usize,
        bind_addr: SocketAddr,
        network: &NetworkConfig,
        config: ReactorConfig,
        telemetry: TelemetryConfig,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self> {
        let listener = create_tcp_listener(bind_addr, network, &config)?;
        let local_addr = listener.local_addr().context("reading listener address")?;

        debug!(
            worker_id = id,
            addr = %local_addr,
            max_sessions = config.max_sessions_per_worker,
            "Echo worker created"
        );

        Ok(Self {
            id,
            listener,
            local_addr,
            config,
            telemetry,
            shutdown,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Run the worker's poll loop until shutdown is signalled.
    pub fn run(self) -> Result<WorkerStats> {
        let EchoWorker {
            id,
            listener,
            local_addr,
            config,
            telemetry,
            shutdown,
        } = self;

        let span = info_span!("worker", worker_id = id, service = %telemetry.service_name);
        let _enter = span.enter();
        info!(addr = %local_addr, "Echo worker starting poll loop");

        let reactor = Rc::new(PollReactor::new());
        let sessions = Rc::new(SessionTable::new(config.max_sessions_per_worker));
        let stats = Rc::new(RefCell::new(WorkerStats::default()));
        let timeout = Duration::from_millis(config.poll_timeout_ms);

        let listener_fd = listener.as_raw_fd();
        let acceptor = Rc::new(Acceptor {
            listener,
            reactor: Rc::downgrade(&reactor),
            sessions: Rc::clone(&sessions),
            stats: Rc::clone(&stats),
            config,
        });
        reactor
            .register(listener_fd, InterestHandle::new(Interest::READABLE), acceptor)
            .context("registering listener")?;

        while !shutdown.load(Ordering::Relaxed) {
            if let Err(e) = reactor.poll_once(Some(timeout)) {
                error!(error = %e, "poll failed, stopping worker");
                sessions.close_all();
                return Err(e).context("polling descriptors");
            }
        }

        // Stop accepting, then give closing sessions a bounded chance to drain.
        reactor.deregister(listener_fd);
        sessions.close_all();

        let deadline = Instant::now() + SHUTDOWN_GRACE;
        while !sessions.is_empty() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            reactor
                .poll_once(Some(timeout.min(deadline - now)))
                .context("polling descriptors during shutdown")?;
        }
        if !sessions.is_empty() {
            warn!(remaining = sessions.len(), "sessions still draining at shutdown");
        }

        let stats = *stats.borrow();
        if telemetry.log_worker_stats {
            info!(
                accepted = stats.accepted,
                refused = stats.refused,
                closed = stats.closed,
                bytes_echoed = stats.bytes_echoed,
                blocked = stats.blocked,
                hangups = stats.hangups,
                errors = stats.errors,
                "Echo worker stopped"
            );
        }

        Ok(stats)
    }
}

/// Handle for managing worker threads.
pub struct NetIoHandle {
    workers: Vec<JoinHandle<Result<WorkerStats>>>,
    shutdown: Arc<AtomicBool>,
    local_addr: SocketAddr,
}

impl NetIoHandle {
    /// Get the number of worker threads
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Address all workers listen on, with an OS-assigned port resolved.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Signal all workers to shut down and wait for them to complete.
    ///
    /// Returns the counters of all workers that exited cleanly.
    pub fn shutdown(mut self) -> WorkerStats {
        info!("Shutting down worker threads");
        self.shutdown.store(true, Ordering::Relaxed);

        let mut total = WorkerStats::default();
        for (i, worker) in self.workers.drain(..).enumerate() {
            match worker.join() {
                Ok(Ok(stats)) => {
                    debug!(worker_id = i, "Worker thread exited cleanly");
                    total.merge(&stats);
                }
                Ok(Err(e)) => {
                    error!(worker_id = i, error = ?e, "Worker thread returned error");
                }
                Err(e) => {
                    error!(worker_id = i, error = ?e, "Worker thread panicked");
                }
            }
        }

        info!("Worker shutdown complete");
        total
    }
}

impl Drop for NetIoHandle {
    fn drop(&mut self) {
        // Threads are not joined here; call shutdown() for a graceful stop.
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

/// Spawn echo workers as native OS threads.
///
/// Every worker binds its own listener to `bind_addr`. When the port is `0`,
/// the port picked for the first worker is reused for the others.
///
/// # Errors
///
/// Returns error if:
/// - Worker count is 0
/// - Listener creation fails
/// - Thread spawning fails
///
/// Workers already started are signalled to stop when a later one fails.
pub fn spawn(
    bind_addr: SocketAddr,
    network: &NetworkConfig,
    config: ReactorConfig,
    telemetry: TelemetryConfig,
) -> Result<NetIoHandle> {
    if config.workers == 0 {
        anyhow::bail!("reactor workers must be at least 1");
    }

    info!(
        workers = config.workers,
        addr = %bind_addr,
        reuse_port = config.reuse_port,
        max_sessions_per_worker = config.max_sessions_per_worker,
        "Initializing echo workers"
    );

    let mut handle = NetIoHandle {
        workers: Vec::with_capacity(config.workers),
        shutdown: Arc::new(AtomicBool::new(false)),
        local_addr: bind_addr,
    };

    for worker_id in 0..config.workers {
        let worker = EchoWorker::new(
            worker_id,
            handle.local_addr,
            network,
            config.clone(),
            telemetry.clone(),
            Arc::clone(&handle.shutdown),
        )
        .with_context(|| format!("creating worker {}", worker_id))?;
        handle.local_addr = worker.local_addr();

        let thread = thread::Builder::new()
            .name(format!("reactd-worker-{}", worker_id))
            .spawn(move || worker.run())
            .with_context(|| format!("spawning worker thread {}", worker_id))?;

        handle.workers.push(thread);
    }

    info!(workers = handle.worker_count(), addr = %handle.local_addr, "Echo workers started");
    Ok(handle)
}
