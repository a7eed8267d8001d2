//! reactd library crate.
//!
//! The daemon binary lives in main.rs; the modules are exposed here so that
//! integration tests and benchmarks can drive them directly.

pub mod config;
pub mod netio;
pub mod reactor;
pub mod runtime;
pub mod telemetry;
pub mod worker;
