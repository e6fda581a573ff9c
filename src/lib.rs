//! gatecheck - conformance harness for permission-gated tool servers
//!
//! Validates that a target server exposes its operation catalogue over
//! line-delimited JSON-RPC and JSON-over-HTTP, and that its per-operation
//! authorization policy holds on both transports.

pub mod commands;
pub mod common;
pub mod harness;
pub mod report;
pub mod scenario;
pub mod sut;
pub mod transport;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use transport::{Outcome, Request, Transport};
