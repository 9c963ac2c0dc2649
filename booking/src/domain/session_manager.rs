//! Publishes the current identity to every interested consumer.
//!
//! State lives in a `tokio::sync::watch` channel. Each completed operation
//! replaces the published value, so when two resolutions race the last one
//! to finish wins.

use tokio::sync::watch;
use tracing::{info, warn};

use crate::domain::ports::{ProfileRepository, SessionStore};
use crate::domain::{Credentials, Identity, IdentityError, IdentityResolver, IdentityState, SessionUser};

/// Owns the published [`IdentityState`].
pub struct SessionManager<S, P> {
    resolver: IdentityResolver<S, P>,
    state: watch::Sender<IdentityState>,
}

impl<S, P> SessionManager<S, P> {
    /// Start in [`IdentityState::Unknown`] until the first resolution completes.
    pub fn new(resolver: IdentityResolver<S, P>) -> Self {
        let (state, _) = watch::channel(IdentityState::Unknown);
        Self { resolver, state }
    }

    /// Receive every future state change.
    pub fn subscribe(&self) -> watch::Receiver<IdentityState> {
        self.state.subscribe()
    }

    /// Snapshot of the published state.
    pub fn current(&self) -> IdentityState {
        self.state.borrow().clone()
    }

    fn publish(&self, next: IdentityState) {
        self.state.send_replace(next);
    }
}

impl<S, P> SessionManager<S, P>
where
    S: SessionStore,
    P: ProfileRepository,
{
    /// Re-run resolution and publish the outcome.
    ///
    /// Any failure publishes [`IdentityState::SignedOut`] before the error is
    /// returned.
    pub async fn refresh(&self) -> Result<IdentityState, IdentityError> {
        match self.resolver.resolve().await {
            Ok(identity) => {
                let next = IdentityState::from(identity);
                self.publish(next.clone());
                Ok(next)
            }
            Err(err) => {
                warn!(error = %err, code = ?err.code(), "identity resolution failed");
                self.publish(IdentityState::SignedOut);
                Err(err)
            }
        }
    }

    /// Sign in and publish the role-only identity.
    ///
    /// A failed sign-in leaves the published state untouched.
    pub async fn log_in(&self, credentials: &Credentials) -> Result<Identity, IdentityError> {
        let identity = self.resolver.log_in(credentials).await?;
        info!(user_id = %identity.id(), role = %identity.role().as_str(), "signed in");
        self.publish(IdentityState::SignedIn(identity.clone()));
        Ok(identity)
    }

    /// Register new credentials. The published state does not change.
    pub async fn sign_up(&self, credentials: &Credentials) -> Result<SessionUser, IdentityError> {
        let user = self.resolver.sign_up(credentials).await?;
        info!(user_id = %user.id, "account registered");
        Ok(user)
    }

    /// End the session and publish [`IdentityState::SignedOut`].
    ///
    /// The local state is cleared even when the authority call fails.
    pub async fn log_out(&self) -> Result<(), IdentityError> {
        let outcome = self.resolver.log_out().await;
        self.publish(IdentityState::SignedOut);
        if outcome.is_ok() {
            info!("signed out");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use std::sync::Arc;

    use super::*;
    use crate::domain::ports::{
        MockProfileRepository, MockSessionStore, ProfileProjection, ProfileRecord,
        ProfileRepositoryError, SessionStoreError,
    };
    use crate::domain::{AccessToken, Email, Role, Session, UserId};
    use rstest::{fixture, rstest};

    #[fixture]
    fn session() -> Session {
        Session {
            user: SessionUser {
                id: UserId::new("22222222-2222-2222-2222-222222222222").expect("user id"),
                email: Some(Email::new("bo@clinic.example").expect("email")),
            },
            access_token: AccessToken::new("jwt"),
        }
    }

    fn owner_profile() -> ProfileRecord {
        ProfileRecord {
            role: Role::Owner,
            display_name: None,
            pets: Vec::new(),
        }
    }

    fn manager(
        store: MockSessionStore,
        profiles: MockProfileRepository,
    ) -> SessionManager<MockSessionStore, MockProfileRepository> {
        SessionManager::new(IdentityResolver::new(Arc::new(store), Arc::new(profiles)))
    }

    #[rstest]
    fn starts_unknown() {
        let manager = manager(MockSessionStore::new(), MockProfileRepository::new());
        assert_eq!(manager.current(), IdentityState::Unknown);
    }

    #[rstest]
    #[tokio::test]
    async fn refresh_publishes_the_resolved_identity(session: Session) {
        let mut store = MockSessionStore::new();
        store
            .expect_current_session()
            .return_once(move || Ok(Some(session)));
        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_fetch_profile()
            .withf(|_, projection| *projection == ProfileProjection::Full)
            .return_once(|_, _| Ok(Some(owner_profile())));
        let manager = manager(store, profiles);
        let mut updates = manager.subscribe();

        let state = manager.refresh().await.expect("refresh");

        assert!(updates.has_changed().expect("sender alive"));
        let published = updates.borrow_and_update().clone();
        assert_eq!(published, state);
        assert_eq!(
            published.identity().map(|identity| identity.role().clone()),
            Some(Role::Owner)
        );
    }

    #[rstest]
    #[tokio::test]
    async fn refresh_without_session_publishes_signed_out() {
        let mut store = MockSessionStore::new();
        store.expect_current_session().return_once(|| Ok(None));
        let manager = manager(store, MockProfileRepository::new());

        let state = manager.refresh().await.expect("refresh");
        assert_eq!(state, IdentityState::SignedOut);
        assert_eq!(manager.current(), IdentityState::SignedOut);
    }

    #[rstest]
    #[tokio::test]
    async fn failed_refresh_publishes_signed_out(session: Session) {
        let mut store = MockSessionStore::new();
        store
            .expect_current_session()
            .return_once(move || Ok(Some(session)));
        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_fetch_profile()
            .return_once(|_, _| Err(ProfileRepositoryError::connection("timeout")));
        let manager = manager(store, profiles);

        let err = manager.refresh().await.expect_err("lookup fails");
        assert!(matches!(err, IdentityError::ProfileLookup { .. }));
        assert_eq!(manager.current(), IdentityState::SignedOut);
    }

    #[rstest]
    #[tokio::test]
    async fn failed_log_in_keeps_the_previous_state() {
        let mut store = MockSessionStore::new();
        store
            .expect_sign_in()
            .return_once(|_| Err(SessionStoreError::rejected("Invalid login credentials")));
        let manager = manager(store, MockProfileRepository::new());
        let credentials =
            Credentials::try_from_parts("bo@clinic.example", "wrong").expect("credentials");

        manager.log_in(&credentials).await.expect_err("rejected");
        assert_eq!(manager.current(), IdentityState::Unknown);
    }

    #[rstest]
    #[tokio::test]
    async fn log_in_publishes_a_partial_identity(session: Session) {
        let mut store = MockSessionStore::new();
        store.expect_sign_in().return_once(move |_| Ok(session));
        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_fetch_profile()
            .return_once(|_, _| Ok(Some(owner_profile())));
        let manager = manager(store, profiles);
        let credentials =
            Credentials::try_from_parts("bo@clinic.example", "secret").expect("credentials");

        let identity = manager.log_in(&credentials).await.expect("log in");
        assert!(identity.is_partial());
        assert_eq!(manager.current(), IdentityState::SignedIn(identity));
    }

    #[rstest]
    #[case::full_resolve(true)]
    #[case::session_gone(false)]
    #[tokio::test]
    async fn the_last_publication_wins(session: Session, #[case] session_held: bool) {
        let mut store = MockSessionStore::new();
        let signed_in = session.clone();
        store.expect_sign_in().return_once(move |_| Ok(signed_in));
        store
            .expect_current_session()
            .return_once(move || Ok(session_held.then_some(session)));
        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_fetch_profile()
            .times(if session_held { 2 } else { 1 })
            .returning(|_, _| Ok(Some(owner_profile())));
        let manager = manager(store, profiles);
        let mut updates = manager.subscribe();
        let credentials =
            Credentials::try_from_parts("bo@clinic.example", "secret").expect("credentials");

        let partial = manager.log_in(&credentials).await.expect("log in");
        assert_eq!(manager.current(), IdentityState::SignedIn(partial));
        let refreshed = manager.refresh().await.expect("refresh");

        assert_eq!(manager.current(), refreshed);
        assert_eq!(*updates.borrow_and_update(), refreshed);
        match refreshed.identity() {
            Some(identity) => {
                assert!(session_held);
                assert!(!identity.is_partial());
            }
            None => {
                assert!(!session_held);
                assert_eq!(refreshed, IdentityState::SignedOut);
            }
        }
    }

    #[rstest]
    #[tokio::test]
    async fn log_out_replaces_a_signed_in_state(session: Session) {
        let mut store = MockSessionStore::new();
        let signed_in = session.clone();
        store.expect_sign_in().return_once(move |_| Ok(signed_in));
        store
            .expect_current_session()
            .return_once(move || Ok(Some(session)));
        store.expect_sign_out().return_once(|| Ok(()));
        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_fetch_profile()
            .return_once(|_, _| Ok(Some(owner_profile())));
        let manager = manager(store, profiles);
        let credentials =
            Credentials::try_from_parts("bo@clinic.example", "secret").expect("credentials");

        manager.log_in(&credentials).await.expect("log in");
        manager.log_out().await.expect("log out");

        assert_eq!(manager.current(), IdentityState::SignedOut);
    }

    #[rstest]
    #[tokio::test]
    async fn log_out_clears_state_even_when_the_authority_fails(session: Session) {
        let mut store = MockSessionStore::new();
        store
            .expect_current_session()
            .return_once(move || Ok(Some(session)));
        store
            .expect_sign_out()
            .return_once(|| Err(SessionStoreError::connection("reset")));
        let manager = manager(store, MockProfileRepository::new());

        manager.log_out().await.expect_err("authority failed");
        assert_eq!(manager.current(), IdentityState::SignedOut);
    }
}
