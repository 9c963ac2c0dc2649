//! Write-side port for slot availability.
//!
//! Availability only ever moves from `true` to `false` through this port.
//! There is deliberately no operation that makes a slot bookable again.

use async_trait::async_trait;

use crate::domain::SlotId;

use super::define_port_error;

define_port_error! {
    /// Errors raised when updating slot availability.
    pub enum SlotRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "slot update connection failed: {message}",
        /// Update failed during execution.
        Query { message: String } => "slot update failed: {message}",
    }
}

/// Port for flipping slot availability.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Set `is_available = false` on the slot matched by id, unconditionally.
    async fn mark_unavailable(&self, slot_id: SlotId) -> Result<(), SlotRepositoryError>;

    /// Set `is_available = false` only where it is still `true`.
    ///
    /// Returns `true` when exactly this call flipped the flag.
    async fn claim_if_available(&self, slot_id: SlotId) -> Result<bool, SlotRepositoryError>;
}
