//! Domain primitives, services and ports.
//!
//! Purpose: model the booking core independently of any backend. Services
//! depend only on the traits in [`ports`]; adapters live in
//! [`crate::outbound`].
//!
//! Public surface:
//! - IdentityResolver / SessionManager: session to enriched identity, and
//!   the published identity state.
//! - CatalogLoader: services, bookable slots and the owner's pets.
//! - BookingWorkflow / BookingForm: appointment creation and the form state
//!   around it.

pub mod auth;
pub mod booking;
pub mod booking_form;
pub mod booking_service;
pub mod catalog;
pub mod catalog_service;
pub mod error;
pub mod identity;
pub mod identity_service;
pub mod ports;
pub mod record_id;
pub mod session_manager;
pub mod user;

pub use self::auth::{AccessToken, Credentials, CredentialsValidationError, Session, SessionUser};
pub use self::booking::{
    Appointment, BookingMode, BookingSelection, NewAppointment, SelectionField,
    SelectionValidationError, UnknownBookingMode,
};
pub use self::booking_form::{BOOKED_MESSAGE, BookingForm, Notice, SelectionDraft};
pub use self::booking_service::BookingWorkflow;
pub use self::catalog::{
    AvailableSlot, CatalogKind, CatalogLoadError, CatalogSnapshot, DEFAULT_DATE_PATTERN,
    DEFAULT_TIME_PATTERN, LabelFormatError, Service, Slot, SlotLabelFormat, bookable_in_order,
};
pub use self::catalog_service::CatalogLoader;
pub use self::error::{BookingError, ErrorCode, IdentityError};
pub use self::identity::{Identity, IdentityState, Pet, ProfileDepth};
pub use self::identity_service::IdentityResolver;
pub use self::record_id::{AppointmentId, PetId, RecordIdError, ServiceId, SlotId};
pub use self::session_manager::SessionManager;
pub use self::user::{DISPLAY_NAME_MAX, DisplayName, Email, Role, UserId, UserValidationError};
