//! Identity resolution against the session authority and the profile table.
//!
//! The resolver is stateless: it composes the two driven ports and returns
//! explicit results. Publishing the outcome is [`super::SessionManager`]'s
//! job.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::domain::ports::{ProfileProjection, ProfileRecord, ProfileRepository, SessionStore};
use crate::domain::{Credentials, Identity, IdentityError, SessionUser, UserId};

/// Derives enriched identities from sessions.
pub struct IdentityResolver<S, P> {
    session_store: Arc<S>,
    profiles: Arc<P>,
}

impl<S, P> Clone for IdentityResolver<S, P> {
    fn clone(&self) -> Self {
        Self {
            session_store: Arc::clone(&self.session_store),
            profiles: Arc::clone(&self.profiles),
        }
    }
}

impl<S, P> IdentityResolver<S, P> {
    /// Create a resolver over the session authority and profile lookup.
    pub fn new(session_store: Arc<S>, profiles: Arc<P>) -> Self {
        Self {
            session_store,
            profiles,
        }
    }
}

impl<S, P> IdentityResolver<S, P>
where
    S: SessionStore,
    P: ProfileRepository,
{
    /// Resolve the full identity behind the current session.
    ///
    /// Returns `Ok(None)` without touching the profile table when no session
    /// exists.
    pub async fn resolve(&self) -> Result<Option<Identity>, IdentityError> {
        let session = self
            .session_store
            .current_session()
            .await
            .map_err(|source| {
                warn!(error = %source, "session check failed; treating as signed out");
                IdentityError::Session { source }
            })?;

        let Some(session) = session else {
            debug!("no active session");
            return Ok(None);
        };

        let profile = self
            .lookup(&session.user.id, ProfileProjection::Full)
            .await?;
        Ok(Some(Identity::from_profile(session.user, profile)))
    }

    /// Sign in and derive the role-only identity.
    ///
    /// The returned identity carries no pets; run [`Self::resolve`] before
    /// relying on them.
    pub async fn log_in(&self, credentials: &Credentials) -> Result<Identity, IdentityError> {
        let session = self
            .session_store
            .sign_in(credentials)
            .await
            .map_err(|source| {
                warn!(email = %credentials.email(), error = %source, "sign-in failed");
                IdentityError::SignIn { source }
            })?;

        let profile = self
            .lookup(&session.user.id, ProfileProjection::RoleOnly)
            .await?;
        Ok(Identity::role_only(session.user, profile.role))
    }

    /// Register new credentials. No profile exists until onboarding assigns
    /// a role, so no identity is derived.
    pub async fn sign_up(&self, credentials: &Credentials) -> Result<SessionUser, IdentityError> {
        self.session_store
            .sign_up(credentials)
            .await
            .map_err(|source| {
                warn!(email = %credentials.email(), error = %source, "sign-up failed");
                IdentityError::SignUp { source }
            })
    }

    /// End the session at the authority.
    ///
    /// With no active session this makes no sign-out call and succeeds. A
    /// failed session check still attempts the sign-out.
    pub async fn log_out(&self) -> Result<(), IdentityError> {
        match self.session_store.current_session().await {
            Ok(None) => {
                debug!("sign-out requested without an active session");
                return Ok(());
            }
            Ok(Some(_)) => {}
            Err(err) => {
                debug!(error = %err, "session check failed before sign-out");
            }
        }

        self.session_store.sign_out().await.map_err(|source| {
            warn!(error = %source, "sign-out failed");
            IdentityError::SignOut { source }
        })
    }

    async fn lookup(
        &self,
        user_id: &UserId,
        projection: ProfileProjection,
    ) -> Result<ProfileRecord, IdentityError> {
        match self.profiles.fetch_profile(user_id, projection).await {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => {
                error!(%user_id, ?projection, "profile lookup returned no row");
                Err(IdentityError::ProfileMissing {
                    user_id: user_id.clone(),
                })
            }
            Err(source) => {
                error!(%user_id, ?projection, error = %source, "profile lookup failed");
                Err(IdentityError::ProfileLookup {
                    user_id: user_id.clone(),
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
#[path = "identity_service_tests.rs"]
mod tests;
