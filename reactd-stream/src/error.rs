//! Error types for stream operations.

use crate::stream::StreamState;
use std::io;
use thiserror::Error;

/// Result type for stream operations.
pub type Result<T> = std::result::Result<T, StreamError>;

/// Errors returned by the fallible stream operations.
///
/// I/O failures observed while servicing readiness never surface here; they
/// are reported to the bound handler as [`StreamEvent::Error`](crate::StreamEvent::Error).
#[derive(Debug, Error)]
pub enum StreamError {
    /// The stream has been torn down.
    #[error("stream is closed")]
    Closed,

    /// The stream no longer accepts output in its current state.
    #[error("stream is not writable in state {0:?}")]
    NotWritable(StreamState),

    /// The descriptor could not be switched to non-blocking mode.
    #[error("failed to set descriptor non-blocking: {0}")]
    Nonblocking(#[source] io::Error),

    /// The multiplexer refused the registration.
    #[error("failed to register descriptor: {0}")]
    Register(#[source] io::Error),
}
