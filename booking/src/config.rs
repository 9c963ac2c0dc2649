//! Backend configuration loaded via OrthoConfig.
//!
//! [`BookingSettings`] is the raw layered input (CLI, `BOOKING_*`
//! environment variables, config file). [`BookingSettings::validate`] turns
//! it into a [`BackendConfig`] the adapters and services consume.

use std::fmt;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::{
    BookingMode, DEFAULT_DATE_PATTERN, DEFAULT_TIME_PATTERN, LabelFormatError, SlotLabelFormat,
    UnknownBookingMode,
};

/// Table name used when none is configured.
pub const DEFAULT_APPOINTMENTS_TABLE: &str = "appointments";

/// Raw settings for the booking backend.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "BOOKING")]
pub struct BookingSettings {
    /// Base URL of the backend, e.g. `https://project.supabase.co`.
    pub backend_url: Option<String>,
    /// Public API key sent as the `apikey` header.
    pub api_key: Option<String>,
    /// Per-request timeout in milliseconds. Unset means no timeout.
    pub request_timeout_ms: Option<u64>,
    /// Name of the appointments table.
    pub appointments_table: Option<String>,
    /// `two_step` (default) or `conditional`.
    pub booking_mode: Option<String>,
    /// strftime pattern for the date part of slot labels.
    pub label_date_pattern: Option<String>,
    /// strftime pattern for the time part of slot labels.
    pub label_time_pattern: Option<String>,
}

/// Errors raised while validating [`BookingSettings`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No base URL was supplied.
    #[error("backend url is not configured")]
    MissingBackendUrl,
    /// The base URL did not parse.
    #[error("backend url '{url}' is invalid: {source}")]
    InvalidBackendUrl {
        /// URL as configured.
        url: String,
        /// Parser failure.
        source: url::ParseError,
    },
    /// The base URL is neither http nor https.
    #[error("backend url '{url}' must use http or https")]
    UnsupportedScheme {
        /// URL as configured.
        url: String,
    },
    /// No API key was supplied.
    #[error("api key is not configured")]
    MissingApiKey,
    /// The appointments table name is blank.
    #[error("appointments table name must not be empty")]
    EmptyTableName,
    /// A zero request timeout was supplied.
    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
    /// The booking mode name is unknown.
    #[error(transparent)]
    BookingMode(#[from] UnknownBookingMode),
    /// A slot label pattern is invalid.
    #[error(transparent)]
    LabelFormat(#[from] LabelFormatError),
}

impl BookingSettings {
    /// Configured appointments table, falling back to the default.
    pub fn appointments_table(&self) -> &str {
        self.appointments_table
            .as_deref()
            .unwrap_or(DEFAULT_APPOINTMENTS_TABLE)
    }

    /// Configured date pattern, falling back to the default.
    pub fn label_date_pattern(&self) -> &str {
        self.label_date_pattern
            .as_deref()
            .unwrap_or(DEFAULT_DATE_PATTERN)
    }

    /// Configured time pattern, falling back to the default.
    pub fn label_time_pattern(&self) -> &str {
        self.label_time_pattern
            .as_deref()
            .unwrap_or(DEFAULT_TIME_PATTERN)
    }

    /// Configured booking mode, falling back to two-step.
    pub fn booking_mode(&self) -> Result<BookingMode, UnknownBookingMode> {
        self.booking_mode
            .as_deref()
            .map_or(Ok(BookingMode::default()), str::parse::<BookingMode>)
    }

    /// Validate the raw settings.
    pub fn validate(&self) -> Result<BackendConfig, ConfigError> {
        let raw_url = self
            .backend_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingBackendUrl)?;
        let base_url = parse_base_url(raw_url)?;

        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?
            .to_owned();

        let appointments_table = self.appointments_table().trim();
        if appointments_table.is_empty() {
            return Err(ConfigError::EmptyTableName);
        }

        let request_timeout = match self.request_timeout_ms {
            Some(0) => return Err(ConfigError::ZeroTimeout),
            Some(ms) => Some(Duration::from_millis(ms)),
            None => None,
        };

        Ok(BackendConfig {
            base_url,
            api_key,
            request_timeout,
            appointments_table: appointments_table.to_owned(),
            booking_mode: self.booking_mode()?,
            label_format: SlotLabelFormat::new(
                self.label_date_pattern(),
                self.label_time_pattern(),
            )?,
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw).map_err(|source| ConfigError::InvalidBackendUrl {
        url: raw.to_owned(),
        source,
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme {
            url: raw.to_owned(),
        });
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Validated backend configuration.
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL, always ending in `/`.
    pub base_url: Url,
    /// Anonymous API key sent as `apikey` on every request.
    pub api_key: String,
    /// Per-request timeout; `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
    /// Table that appointment rows are inserted into.
    pub appointments_table: String,
    /// How a booking reserves its slot.
    pub booking_mode: BookingMode,
    /// Patterns used to label offered slots.
    pub label_format: SlotLabelFormat,
}

impl BackendConfig {
    /// Configuration for `base_url` with every optional setting defaulted.
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            base_url,
            api_key: api_key.into(),
            request_timeout: None,
            appointments_table: DEFAULT_APPOINTMENTS_TABLE.to_owned(),
            booking_mode: BookingMode::default(),
            label_format: SlotLabelFormat::default(),
        }
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .field("appointments_table", &self.appointments_table)
            .field("booking_mode", &self.booking_mode)
            .field("label_format", &self.label_format)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for backend configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 7] = [
        "BOOKING_BACKEND_URL",
        "BOOKING_API_KEY",
        "BOOKING_REQUEST_TIMEOUT_MS",
        "BOOKING_APPOINTMENTS_TABLE",
        "BOOKING_BOOKING_MODE",
        "BOOKING_LABEL_DATE_PATTERN",
        "BOOKING_LABEL_TIME_PATTERN",
    ];

    fn load_from_empty_args() -> BookingSettings {
        BookingSettings::load_from_iter([OsString::from("booking")]).expect("config should load")
    }

    fn settings(url: &str) -> BookingSettings {
        BookingSettings {
            backend_url: Some(url.to_owned()),
            api_key: Some("anon-key".to_owned()),
            request_timeout_ms: None,
            appointments_table: None,
            booking_mode: None,
            label_date_pattern: None,
            label_time_pattern: None,
        }
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert!(settings.backend_url.is_none());
        assert_eq!(settings.appointments_table(), DEFAULT_APPOINTMENTS_TABLE);
        assert_eq!(settings.booking_mode(), Ok(BookingMode::TwoStep));
        assert_eq!(settings.label_date_pattern(), DEFAULT_DATE_PATTERN);
        assert_eq!(settings.validate().err(), Some(ConfigError::MissingBackendUrl));
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("BOOKING_BACKEND_URL", Some("https://demo.supabase.co".to_owned())),
            ("BOOKING_API_KEY", Some("anon-key".to_owned())),
            ("BOOKING_REQUEST_TIMEOUT_MS", Some("2500".to_owned())),
            ("BOOKING_APPOINTMENTS_TABLE", Some("appoiments".to_owned())),
            ("BOOKING_BOOKING_MODE", Some("conditional".to_owned())),
            ("BOOKING_LABEL_DATE_PATTERN", Some("%Y-%m-%d".to_owned())),
            ("BOOKING_LABEL_TIME_PATTERN", None::<String>),
        ]);

        let config = load_from_empty_args().validate().expect("valid settings");
        assert_eq!(config.base_url.as_str(), "https://demo.supabase.co/");
        assert_eq!(config.request_timeout, Some(Duration::from_millis(2500)));
        assert_eq!(config.appointments_table, "appoiments");
        assert_eq!(config.booking_mode, BookingMode::Conditional);
        assert_eq!(
            config.label_format,
            SlotLabelFormat::new("%Y-%m-%d", DEFAULT_TIME_PATTERN).expect("patterns")
        );
    }

    #[rstest]
    #[case("https://demo.supabase.co", "https://demo.supabase.co/")]
    #[case("http://localhost:54321/project", "http://localhost:54321/project/")]
    #[case(" https://demo.supabase.co/ ", "https://demo.supabase.co/")]
    fn base_url_always_ends_with_a_slash(#[case] raw: &str, #[case] expected: &str) {
        let config = settings(raw).validate().expect("valid url");
        assert_eq!(config.base_url.as_str(), expected);
    }

    #[rstest]
    fn rejects_non_http_urls() {
        let err = settings("ftp://demo.example").validate().expect_err("bad scheme");
        assert!(matches!(err, ConfigError::UnsupportedScheme { .. }));
    }

    #[rstest]
    fn rejects_blank_api_keys() {
        let mut raw = settings("https://demo.supabase.co");
        raw.api_key = Some("   ".to_owned());
        assert_eq!(raw.validate().err(), Some(ConfigError::MissingApiKey));
    }

    #[rstest]
    #[case(Some(0), None, Some(ConfigError::ZeroTimeout))]
    #[case(None, Some(""), Some(ConfigError::EmptyTableName))]
    #[case(Some(10), Some("bookings"), None)]
    fn validates_timeout_and_table(
        #[case] timeout: Option<u64>,
        #[case] table: Option<&str>,
        #[case] expected: Option<ConfigError>,
    ) {
        let mut raw = settings("https://demo.supabase.co");
        raw.request_timeout_ms = timeout;
        raw.appointments_table = table.map(str::to_owned);
        assert_eq!(raw.validate().err(), expected);
    }

    #[rstest]
    fn unknown_booking_mode_is_reported() {
        let mut raw = settings("https://demo.supabase.co");
        raw.booking_mode = Some("atomic".to_owned());
        assert!(matches!(
            raw.validate(),
            Err(ConfigError::BookingMode(UnknownBookingMode(mode))) if mode == "atomic"
        ));
    }

    #[rstest]
    fn debug_output_hides_the_api_key() {
        let config = settings("https://demo.supabase.co")
            .validate()
            .expect("valid");
        assert!(!format!("{config:?}").contains("anon-key"));
    }
}
