//! Identity resolution, catalog loading and slot reservation for pet
//! service appointments.
//!
//! The [`domain`] module holds the services and the ports they drive;
//! [`outbound`] provides the REST adapter for a Supabase-style backend and,
//! behind the `test-support` feature, an in-memory backend.

pub mod config;
pub mod domain;
pub mod outbound;
pub mod telemetry;

pub use config::{BackendConfig, BookingSettings, ConfigError};
pub use telemetry::init_tracing;
