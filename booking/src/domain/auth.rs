//! Authentication primitives: credentials and the session issued for them.
//!
//! Raw form values are validated here before anything reaches the session
//! authority. Secrets are held in zeroising buffers and never printed.

use std::fmt;

use zeroize::Zeroizing;

use crate::domain::{Email, UserId, UserValidationError};

/// Domain error returned when credential form values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsValidationError {
    /// Email was missing or malformed.
    Email(UserValidationError),
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for CredentialsValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email(err) => write!(f, "{err}"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for CredentialsValidationError {}

/// Validated email/password pair used for sign-in and sign-up.
///
/// ## Invariants
/// - `email` is trimmed and shaped like an address.
/// - `password` is non-empty but keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use booking_core::domain::Credentials;
///
/// let creds = Credentials::try_from_parts("ana@clinic.example", "hunter2").unwrap();
/// assert_eq!(creds.email().as_ref(), "ana@clinic.example");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    email: Email,
    password: Zeroizing<String>,
}

impl Credentials {
    /// Construct credentials from raw form inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        let email = Email::new(email).map_err(CredentialsValidationError::Email)?;
        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }

        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email the session authority keys accounts by.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Opaque bearer token issued by the session authority.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(Zeroizing<String>);

impl AccessToken {
    /// Wrap a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(Zeroizing::new(token.into()))
    }

    /// Raw token for the `Authorization` header.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Base user record as known to the session authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    /// Identifier issued by the session authority.
    pub id: UserId,
    /// Address as issued; phone-only accounts have none.
    pub email: Option<Email>,
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: SessionUser,
    /// Bearer token for authorised table requests.
    pub access_token: AccessToken,
}
