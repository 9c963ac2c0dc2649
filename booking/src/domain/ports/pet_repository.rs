//! Read-side port for the signed-in owner's pets.
use async_trait::async_trait;

use crate::domain::{Pet, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised when listing pets.
    pub enum PetRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "pet listing connection failed: {message}",
        /// Query failed during execution or row conversion.
        Query { message: String } => "pet listing failed: {message}",
    }
}

/// Port for listing the pets a user owns.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PetRepository: Send + Sync {
    /// List pets whose `owner_id` equals `owner`.
    async fn list_for_owner(&self, owner: &UserId) -> Result<Vec<Pet>, PetRepositoryError>;
}
