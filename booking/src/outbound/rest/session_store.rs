//! GoTrue-style session authority adapter (`/auth/v1/...`).

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use tracing::debug;

use super::client::{HttpFailure, RestClient, send_empty, send_json};
use super::dto::{AuthUserDto, PasswordGrantDto, SignUpResponseDto, TokenResponseDto};
use crate::domain::ports::{SessionStore, SessionStoreError};
use crate::domain::{AccessToken, Credentials, Session, SessionUser};

/// Session store that keeps the issued session in the shared [`RestClient`].
#[derive(Clone)]
pub struct RestSessionStore {
    client: RestClient,
}

impl RestSessionStore {
    /// Store sessions in `client` so table adapters share them.
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    /// Adopt a previously issued access token.
    ///
    /// The token is checked against `GET /auth/v1/user`; on success the
    /// session is held for subsequent calls.
    pub async fn restore(&self, access_token: AccessToken) -> Result<Session, SessionStoreError> {
        let url = self.client.auth_url("user").map_err(map_failure)?;
        let request = self
            .client
            .request_as(Method::GET, url, access_token.expose());
        let user: AuthUserDto = send_json(request).await.map_err(map_failure)?;
        let session = Session {
            user: user.into_session_user().map_err(SessionStoreError::decode)?,
            access_token,
        };
        self.client.store_session(session.clone()).await;
        debug!(user_id = %session.user.id, "session restored");
        Ok(session)
    }
}

#[async_trait]
impl SessionStore for RestSessionStore {
    async fn current_session(&self) -> Result<Option<Session>, SessionStoreError> {
        Ok(self.client.session().await)
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, SessionStoreError> {
        let mut url = self.client.auth_url("token").map_err(map_failure)?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let request = self
            .client
            .request(Method::POST, url)
            .await
            .json(&grant(credentials));
        let reply: TokenResponseDto = send_json(request).await.map_err(map_failure)?;
        let session = reply.into_session().map_err(SessionStoreError::decode)?;
        self.client.store_session(session.clone()).await;
        Ok(session)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<SessionUser, SessionStoreError> {
        let url = self.client.auth_url("signup").map_err(map_failure)?;
        let request = self
            .client
            .request(Method::POST, url)
            .await
            .json(&grant(credentials));
        let reply: SignUpResponseDto = send_json(request).await.map_err(map_failure)?;
        match reply {
            SignUpResponseDto::Session(token) => {
                let session = token.into_session().map_err(SessionStoreError::decode)?;
                let user = session.user.clone();
                self.client.store_session(session).await;
                Ok(user)
            }
            SignUpResponseDto::Wrapped { user } | SignUpResponseDto::Bare(user) => {
                user.into_session_user().map_err(SessionStoreError::decode)
            }
        }
    }

    async fn sign_out(&self) -> Result<(), SessionStoreError> {
        let Some(session) = self.client.clear_session().await else {
            debug!("no held session to sign out");
            return Ok(());
        };
        let url = self.client.auth_url("logout").map_err(map_failure)?;
        let request = self
            .client
            .request_as(Method::POST, url, session.access_token.expose());
        match send_empty(request).await {
            Ok(()) => Ok(()),
            // The token already expired; nothing is left to revoke.
            Err(HttpFailure::Status {
                status: StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN,
                ..
            }) => Ok(()),
            Err(failure) => Err(map_failure(failure)),
        }
    }
}

fn grant(credentials: &Credentials) -> PasswordGrantDto<'_> {
    PasswordGrantDto {
        email: credentials.email().as_ref(),
        password: credentials.password(),
    }
}

fn map_failure(failure: HttpFailure) -> SessionStoreError {
    match failure {
        HttpFailure::Decode(message) => SessionStoreError::decode(message),
        failure if failure.is_unavailable() => SessionStoreError::connection(failure.to_string()),
        HttpFailure::Status { message, .. } => SessionStoreError::rejected(message),
        failure => SessionStoreError::connection(failure.to_string()),
    }
}
