use serde::{Deserialize, Serialize};

/// Default poll timeout; bounds how long a worker takes to notice shutdown.
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 100;

/// Default cap on concurrent sessions per worker.
pub const DEFAULT_MAX_SESSIONS_PER_WORKER: usize = 1024;

/// Worker and reactor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReactorConfig {
    /// Number of worker threads to spawn.
    /// Each worker is a native OS thread with its own poll reactor and listener.
    /// Defaults to number of CPU cores.
    pub workers: usize,

    /// Upper bound for a single poll(2) wait in milliseconds.
    pub poll_timeout_ms: u64,

    /// Connections accepted beyond this limit are closed immediately.
    pub max_sessions_per_worker: usize,

    /// Enable SO_REUSEPORT so every worker can bind its own listener to the
    /// same port. The kernel then spreads incoming connections across workers.
    pub reuse_port: bool,

    /// Optional kernel receive buffer size (SO_RCVBUF) for accepted connections.
    pub socket_recv_buffer_size: Option<usize>,

    /// Optional kernel send buffer size (SO_SNDBUF) for accepted connections.
    pub socket_send_buffer_size: Option<usize>,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().max(1),
            poll_timeout_ms: DEFAULT_POLL_TIMEOUT_MS,
            max_sessions_per_worker: DEFAULT_MAX_SESSIONS_PER_WORKER,
            reuse_port: true,
            socket_recv_buffer_size: None,
            socket_send_buffer_size: None,
        }
    }
}

impl ReactorConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.workers == 0 {
            errors.push("reactor.workers must be > 0".to_string());
        }

        if self.workers > 1024 {
            errors.push("reactor.workers is unreasonably high (> 1024)".to_string());
        }

        if self.workers > 1 && !self.reuse_port {
            errors.push("reactor.reuse_port must be enabled when workers > 1".to_string());
        }

        if self.poll_timeout_ms == 0 {
            errors.push("reactor.poll_timeout_ms must be > 0".to_string());
        }

        if self.max_sessions_per_worker == 0 {
            errors.push("reactor.max_sessions_per_worker must be > 0".to_string());
        }

        if matches!(self.socket_recv_buffer_size, Some(0)) {
            errors.push("reactor.socket_recv_buffer_size must be > 0 when set".to_string());
        }

        if matches!(self.socket_send_buffer_size, Some(0)) {
            errors.push("reactor.socket_send_buffer_size must be > 0 when set".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
