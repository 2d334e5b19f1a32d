//! Mock device implementations for testing and development.
//!
//! This module provides simulated transports that can be controlled
//! programmatically without requiring physical hardware.

pub mod transport;

// Re-export commonly used types
pub use transport::{MockTransport, MockTransportHandle, OpenFailure};
