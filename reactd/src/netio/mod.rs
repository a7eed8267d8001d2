//! Network I/O utilities module.
//!
//! This module provides pure network functionality:
//! - Listener creation and configuration
//! - Accepted connection tuning
//! - Reactor and worker configuration
//!
//! For worker thread orchestration, see the `worker` module.

pub mod config;
pub(crate) mod socket;

#[cfg(test)]
mod tests;

pub use config::ReactorConfig;
pub(crate) use socket::{configure_accepted, create_tcp_listener};
