//! Driven port for the `users` profile lookup.
//!
//! Both sign-in paths read the same `role` column. The full projection adds
//! the display name and the left-joined pets, so a user without pets still
//! yields a row.

use async_trait::async_trait;

use crate::domain::{DisplayName, Pet, Role, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by profile lookup adapters.
    pub enum ProfileRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "profile lookup connection failed: {message}",
        /// Query failed during execution or row conversion.
        Query { message: String } => "profile lookup failed: {message}",
    }
}

/// Columns requested from the profile row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileProjection {
    /// `role`, `name` and the joined pets.
    Full,
    /// `role` only.
    RoleOnly,
}

/// Profile fields merged into an identity.
///
/// For [`ProfileProjection::RoleOnly`] lookups `display_name` is `None` and
/// `pets` is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRecord {
    /// Role stored on the profile row.
    pub role: Role,
    /// Stored display name, if the row has one.
    pub display_name: Option<DisplayName>,
    /// Owned pets; empty for [`ProfileProjection::RoleOnly`].
    pub pets: Vec<Pet>,
}

/// Port for reading a user's profile row.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetch the profile keyed by `user_id`; `Ok(None)` when no row exists.
    async fn fetch_profile(
        &self,
        user_id: &UserId,
        projection: ProfileProjection,
    ) -> Result<Option<ProfileRecord>, ProfileRepositoryError>;
}
