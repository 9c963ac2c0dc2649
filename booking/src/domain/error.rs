//! Domain-level error types.
//!
//! Each operation returns its own error enum. The `Display` output is the
//! message shown to the user; [`ErrorCode`] is the stable category callers
//! branch on.

use serde::{Deserialize, Serialize};

use crate::domain::ports::{
    AppointmentRepositoryError, ProfileRepositoryError, SessionStoreError, SlotRepositoryError,
};
use crate::domain::{AppointmentId, CatalogLoadError, PetId, SelectionValidationError, SlotId, UserId};

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed or fails validation.
    InvalidRequest,
    /// Authentication failed or is missing.
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    Forbidden,
    /// The requested resource does not exist.
    NotFound,
    /// The resource changed underneath the request.
    Conflict,
    /// A remote collaborator could not be reached.
    ServiceUnavailable,
    /// An unexpected error occurred.
    InternalError,
}

/// Failures while resolving, signing in or signing out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// The session check failed; treated as "no session".
    #[error("could not check the current session: {source}")]
    Session { source: SessionStoreError },
    /// The authority refused or could not process the sign-in.
    #[error("sign-in failed: {source}")]
    SignIn { source: SessionStoreError },
    /// The authority refused or could not process the registration.
    #[error("sign-up failed: {source}")]
    SignUp { source: SessionStoreError },
    /// The authority could not end the session.
    #[error("sign-out failed: {source}")]
    SignOut { source: SessionStoreError },
    /// The profile join failed.
    #[error("could not load the profile for user {user_id}: {source}")]
    ProfileLookup {
        user_id: UserId,
        source: ProfileRepositoryError,
    },
    /// The profile lookup returned no row.
    #[error("no profile exists for user {user_id}")]
    ProfileMissing { user_id: UserId },
}

impl IdentityError {
    /// Stable category for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Session { source } | Self::SignOut { source } => session_code(source),
            Self::SignIn { source } | Self::SignUp { source } => match source {
                SessionStoreError::Rejected { .. } => ErrorCode::Unauthorized,
                other => session_code(other),
            },
            Self::ProfileLookup { source, .. } => match source {
                ProfileRepositoryError::Connection { .. } => ErrorCode::ServiceUnavailable,
                ProfileRepositoryError::Query { .. } => ErrorCode::InternalError,
            },
            Self::ProfileMissing { .. } => ErrorCode::NotFound,
        }
    }
}

fn session_code(error: &SessionStoreError) -> ErrorCode {
    match error {
        SessionStoreError::Connection { .. } => ErrorCode::ServiceUnavailable,
        SessionStoreError::Rejected { .. } => ErrorCode::Unauthorized,
        SessionStoreError::Decode { .. } => ErrorCode::InternalError,
    }
}

impl CatalogLoadError {
    /// Stable category for this failure.
    pub fn code(&self) -> ErrorCode {
        ErrorCode::ServiceUnavailable
    }
}

/// Failures of the booking workflow.
///
/// The variants name the step that failed so the window between the
/// appointment insert and the slot update can be diagnosed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    /// A required selection field was missing or malformed.
    #[error(transparent)]
    InvalidSelection(#[from] SelectionValidationError),
    /// The pet does not belong to the booking user.
    #[error("pet {pet_id} is not one of your pets")]
    PetNotOwned { pet_id: PetId },
    /// Inserting the appointment failed.
    ///
    /// `claimed_slot` is set when a conditional booking had already taken
    /// the slot before the insert failed.
    #[error("could not create the appointment: {source}")]
    AppointmentInsert {
        claimed_slot: Option<SlotId>,
        source: AppointmentRepositoryError,
    },
    /// Updating the slot failed.
    ///
    /// In two-step mode `appointment_id` names the appointment that now
    /// references a slot still marked available.
    #[error("could not update slot {slot_id}: {source}")]
    SlotUpdate {
        slot_id: SlotId,
        appointment_id: Option<AppointmentId>,
        source: SlotRepositoryError,
    },
    /// The slot was no longer available when the conditional write ran.
    #[error("slot {slot_id} has already been booked")]
    SlotAlreadyTaken { slot_id: SlotId },
}

impl BookingError {
    /// Stable category for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidSelection(_) => ErrorCode::InvalidRequest,
            Self::PetNotOwned { .. } => ErrorCode::Forbidden,
            Self::SlotAlreadyTaken { .. } => ErrorCode::Conflict,
            Self::AppointmentInsert { source, .. } => match source {
                AppointmentRepositoryError::Connection { .. } => ErrorCode::ServiceUnavailable,
                AppointmentRepositoryError::Query { .. } => ErrorCode::InternalError,
            },
            Self::SlotUpdate { source, .. } => match source {
                SlotRepositoryError::Connection { .. } => ErrorCode::ServiceUnavailable,
                SlotRepositoryError::Query { .. } => ErrorCode::InternalError,
            },
        }
    }

    /// Whether an appointment now references a slot still marked available.
    pub fn left_inconsistent(&self) -> bool {
        matches!(
            self,
            Self::SlotUpdate {
                appointment_id: Some(_),
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests;
