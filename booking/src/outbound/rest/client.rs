//! Shared reqwest client for the auth and table endpoints.
//!
//! Owns transport details only: URL construction, the `apikey` and bearer
//! headers, status mapping and JSON decoding. The session issued at sign-in
//! is held here so every table request runs as the signed-in user.

use std::fmt;
use std::sync::Arc;

use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use super::dto::ErrorBodyDto;
use crate::config::BackendConfig;
use crate::domain::Session;

const API_KEY_HEADER: &str = "apikey";

/// A request that did not produce the expected payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum HttpFailure {
    /// The endpoint URL could not be built.
    Url(String),
    /// The request never completed.
    Transport(String),
    /// The server answered with a non-success status.
    Status { status: StatusCode, message: String },
    /// The body did not match the expected shape.
    Decode(String),
}

impl HttpFailure {
    /// Whether retrying later could succeed: transport errors, timeouts,
    /// throttling and server errors.
    pub(super) fn is_unavailable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => {
                status.is_server_error()
                    || *status == StatusCode::REQUEST_TIMEOUT
                    || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Self::Url(_) | Self::Decode(_) => false,
        }
    }

    pub(super) fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(message) => write!(f, "invalid endpoint: {message}"),
            Self::Transport(message) => f.write_str(message),
            Self::Status { status, message } if message.is_empty() => {
                write!(f, "status {}", status.as_u16())
            }
            Self::Status { status, message } => {
                write!(f, "status {}: {message}", status.as_u16())
            }
            Self::Decode(message) => write!(f, "invalid response: {message}"),
        }
    }
}

/// Implements `From<HttpFailure>` for a table port error with
/// `connection` and `query` constructors.
macro_rules! table_error_from_http {
    ($($error:ty),+ $(,)?) => {
        $(
            impl From<$crate::outbound::rest::client::HttpFailure> for $error {
                fn from(failure: $crate::outbound::rest::client::HttpFailure) -> Self {
                    if failure.is_unavailable() {
                        Self::connection(failure.to_string())
                    } else {
                        Self::query(failure.to_string())
                    }
                }
            }
        )+
    };
}

pub(super) use table_error_from_http;

/// Connection to one backend project.
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    base_url: Url,
    api_key: Arc<str>,
    session: Arc<RwLock<Option<Session>>>,
}

impl RestClient {
    /// Build a client for `config`, applying its request timeout if set.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: &BackendConfig) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.clone(),
            api_key: Arc::from(config.api_key.as_str()),
            session: Arc::default(),
        })
    }

    pub(super) fn auth_url(&self, path: &str) -> Result<Url, HttpFailure> {
        self.endpoint(&format!("auth/v1/{path}"))
    }

    pub(super) fn table_url(&self, table: &str) -> Result<Url, HttpFailure> {
        self.endpoint(&format!("rest/v1/{table}"))
    }

    fn endpoint(&self, path: &str) -> Result<Url, HttpFailure> {
        self.base_url
            .join(path)
            .map_err(|err| HttpFailure::Url(format!("{path}: {err}")))
    }

    /// Request authorised as the held session, or as the anonymous key when
    /// none is held.
    pub(super) async fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let session = self.session.read().await;
        let bearer = session
            .as_ref()
            .map_or(&*self.api_key, |session| session.access_token.expose());
        self.request_as(method, url, bearer)
    }

    /// Request authorised with an explicit bearer token.
    pub(super) fn request_as(&self, method: Method, url: Url, bearer: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(API_KEY_HEADER, &*self.api_key)
            .header(ACCEPT, "application/json")
            .bearer_auth(bearer)
    }

    pub(super) async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    pub(super) async fn store_session(&self, session: Session) {
        *self.session.write().await = Some(session);
    }

    pub(super) async fn clear_session(&self) -> Option<Session> {
        self.session.write().await.take()
    }
}

/// Send `request` and decode a JSON body.
pub(super) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
) -> Result<T, HttpFailure> {
    let body = send(request).await?;
    serde_json::from_slice(&body).map_err(|err| HttpFailure::decode(err.to_string()))
}

/// Send `request`, discarding any body.
pub(super) async fn send_empty(request: RequestBuilder) -> Result<(), HttpFailure> {
    send(request).await.map(drop)
}

async fn send(request: RequestBuilder) -> Result<Vec<u8>, HttpFailure> {
    let response = request.send().await.map_err(map_transport_error)?;
    let status = response.status();
    let body = response.bytes().await.map_err(map_transport_error)?;
    if !status.is_success() {
        return Err(map_status_error(status, body.as_ref()));
    }
    Ok(body.to_vec())
}

fn map_transport_error(error: reqwest::Error) -> HttpFailure {
    if error.is_timeout() {
        HttpFailure::Transport(format!("request timed out: {error}"))
    } else {
        HttpFailure::Transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> HttpFailure {
    let message = serde_json::from_slice::<ErrorBodyDto>(body)
        .ok()
        .and_then(ErrorBodyDto::into_message)
        .unwrap_or_else(|| body_preview(body));
    HttpFailure::Status { status, message }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
