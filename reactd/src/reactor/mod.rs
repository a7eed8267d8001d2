//! Readiness multiplexer for worker threads.
//!
//! Each worker thread owns one [`PollReactor`]. Streams and listeners register
//! their descriptor together with a shared interest mask; every cycle the
//! reactor polls the current masks and hands readiness back to the
//! registered handlers on the same thread.
//!
//! ```text
//! loop {
//!     build pollfd set from interest masks
//!     poll(2) with timeout
//!     for each ready descriptor still registered {
//!         handler.on_ready(readiness)
//!     }
//! }
//! ```

pub mod poll;


pub use poll::PollReactor;
