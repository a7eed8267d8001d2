//! reactd-stream: buffered, event-driven byte streams over poll-multiplexed descriptors.
//!
//! A [`Stream`] wraps an already-connected, non-blocking descriptor that is
//! registered with an external [`Multiplexer`]. The multiplexer reports
//! readiness; the stream performs the read or the write and reports the
//! outcome to consumer code as a [`StreamEvent`].
//!
//! # Architecture
//!
//! - **Teardown guard**: every path that calls into consumer code holds a
//!   reference token; terminal teardown runs only when the last token is
//!   dropped
//! - **State machine**: `Open → Closing → Closed`, `Open/Closing → Error → Closed`
//! - **I/O engine**: read coalescing with a zero-copy fast path, and an output
//!   buffer flushed on write readiness
//! - **Event adapter**: a bound [`StreamHandler`] receives every event
//!
//! Consumer callbacks may call back into the stream (`write`, `flush`,
//! `close`) before the triggering call returns. Closing a stream from inside
//! one of its own callbacks defers the `Close` event until the outermost
//! callback has returned.
//!
//! # Threading
//!
//! Streams are single-threaded (`!Send`). All operations on a stream run on
//! the thread that drives its multiplexer.

pub mod buffer;
pub mod descriptor;
pub mod error;
pub mod event;
pub mod interest;
pub mod mux;
pub mod stream;

pub use buffer::ByteBuffer;
pub use descriptor::{set_nonblocking, Descriptor};
pub use error::{Result, StreamError};
pub use event::{handler_fn, ReadData, StreamEvent, StreamHandler};
pub use interest::{Interest, InterestHandle, Readiness};
pub use mux::{Multiplexer, ReadinessHandler};
pub use stream::{Stream, StreamState};

/// Size of the stack scratch buffer used for a single read.
pub const READ_BLOCK_SIZE: usize = 16 * 1024;
