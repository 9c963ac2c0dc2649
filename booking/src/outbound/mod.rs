//! Outbound adapters implementing the domain ports.

#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod rest;
