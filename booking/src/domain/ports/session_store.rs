//! Driven port for the remote session authority.
//!
//! The authority issues and validates credentials and owns the raw user
//! record. The booking core never reimplements it; adapters translate these
//! calls into the authority's own protocol.

use async_trait::async_trait;

use crate::domain::{Credentials, Session, SessionUser};

use super::define_port_error;

define_port_error! {
    /// Errors raised by session authority adapters.
    pub enum SessionStoreError {
        /// The authority could not be reached.
        Connection { message: String } => "session authority unreachable: {message}",
        /// The authority refused the request (bad credentials, duplicate account).
        Rejected { message: String } => "session authority rejected the request: {message}",
        /// The authority replied with a payload that could not be decoded.
        Decode { message: String } => "session authority response invalid: {message}",
    }
}

/// Port for session checks, sign-in, sign-up and sign-out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Return the session currently held, if any.
    async fn current_session(&self) -> Result<Option<Session>, SessionStoreError>;

    /// Exchange email and password for a new session.
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, SessionStoreError>;

    /// Create a new account. No session or profile is implied.
    async fn sign_up(&self, credentials: &Credentials) -> Result<SessionUser, SessionStoreError>;

    /// End the current session at the authority.
    async fn sign_out(&self) -> Result<(), SessionStoreError>;
}
