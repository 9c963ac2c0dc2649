//! Read-side port for the booking form's reference data.
//!
//! Services and available slots are read-only from the core's perspective.
//! Slots are provisioned elsewhere; the core only ever hides them by flipping
//! their availability through [`super::SlotRepository`].

use async_trait::async_trait;

use crate::domain::{Service, Slot};

use super::define_port_error;

define_port_error! {
    /// Errors raised when reading catalog tables.
    pub enum CatalogRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "catalog read connection failed: {message}",
        /// Query failed during execution or row conversion.
        Query { message: String } =>
            "catalog read query failed: {message}",
    }
}

/// Port for reading services and bookable slots.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// All services offered, in table order.
    async fn list_services(&self) -> Result<Vec<Service>, CatalogRepositoryError>;

    /// Slots with `is_available = true`, ordered by date then start time.
    async fn list_available_slots(&self) -> Result<Vec<Slot>, CatalogRepositoryError>;
}
