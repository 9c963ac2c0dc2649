//! In-progress booking form state.
//!
//! Holds the loaded reference data, the raw field values as entered and the
//! last notice shown to the user. Submitting validates the draft, runs the
//! workflow and, on success, clears the draft and reloads the slots so the
//! booked one disappears.

use tracing::debug;

use crate::domain::ports::{AppointmentRepository, CatalogRepository, PetRepository, SlotRepository};
use crate::domain::{
    Appointment, BookingError, BookingSelection, BookingWorkflow, CatalogKind, CatalogLoader,
    CatalogSnapshot, ErrorCode, Identity, SelectionField,
};

/// Message shown after a successful booking.
pub const BOOKED_MESSAGE: &str = "Appointment created!";

/// Raw field values as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionDraft {
    /// Pet id as entered.
    pub pet: String,
    /// Service id as entered.
    pub service: String,
    /// Slot id as entered.
    pub slot: String,
}

impl SelectionDraft {
    /// Whether no field has been filled in.
    pub fn is_empty(&self) -> bool {
        self.pet.is_empty() && self.service.is_empty() && self.slot.is_empty()
    }

    fn parse(&self) -> Result<BookingSelection, BookingError> {
        BookingSelection::try_from_parts(&self.pet, &self.service, &self.slot)
            .map_err(BookingError::from)
    }
}

/// Last message shown on the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The booking went through.
    Success(String),
    /// Something failed; `code` classifies it.
    Error {
        /// Failure class.
        code: ErrorCode,
        /// Text shown to the user.
        message: String,
    },
}

impl Notice {
    /// Text to show the user.
    pub fn message(&self) -> &str {
        match self {
            Self::Success(message) | Self::Error { message, .. } => message,
        }
    }
}

/// Booking form for one signed-in owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingForm {
    snapshot: CatalogSnapshot,
    draft: SelectionDraft,
    notice: Option<Notice>,
}

impl BookingForm {
    /// Load services, slots and the owner's pets.
    ///
    /// A failed catalog becomes the form's error notice; whatever loaded is
    /// still offered.
    pub async fn open<C, P>(loader: &CatalogLoader<C, P>, owner: &Identity) -> Self
    where
        C: CatalogRepository,
        P: PetRepository,
    {
        let snapshot = loader.load_form(owner.id()).await;
        let notice = snapshot.failures.last().map(|failure| Notice::Error {
            code: failure.code(),
            message: failure.to_string(),
        });
        Self {
            snapshot,
            draft: SelectionDraft::default(),
            notice,
        }
    }

    /// Catalogues offered by the form.
    pub fn snapshot(&self) -> &CatalogSnapshot {
        &self.snapshot
    }

    /// Field values as last entered.
    pub fn draft(&self) -> &SelectionDraft {
        &self.draft
    }

    /// Outcome of the last open or submit, if any.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Record the raw value entered for `field`.
    pub fn set(&mut self, field: SelectionField, value: impl Into<String>) {
        let value = value.into();
        match field {
            SelectionField::Pet => self.draft.pet = value,
            SelectionField::Service => self.draft.service = value,
            SelectionField::Slot => self.draft.slot = value,
        }
    }

    /// Validate the draft and book it.
    ///
    /// The previous notice is cleared first and replaced by the outcome.
    pub async fn submit<A, S, C, P>(
        &mut self,
        workflow: &BookingWorkflow<A, S>,
        loader: &CatalogLoader<C, P>,
        owner: &Identity,
    ) -> Result<Appointment, BookingError>
    where
        A: AppointmentRepository,
        S: SlotRepository,
        C: CatalogRepository,
        P: PetRepository,
    {
        self.notice = None;
        let outcome = match self.draft.parse() {
            Ok(selection) => {
                workflow
                    .book(owner, &self.snapshot.pets, &selection)
                    .await
            }
            Err(err) => Err(err),
        };

        match outcome {
            Ok(appointment) => {
                self.notice = Some(Notice::Success(BOOKED_MESSAGE.to_owned()));
                self.draft = SelectionDraft::default();
                self.reload_slots(loader).await;
                Ok(appointment)
            }
            Err(err) => {
                self.notice = Some(Notice::Error {
                    code: err.code(),
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn reload_slots<C, P>(&mut self, loader: &CatalogLoader<C, P>)
    where
        C: CatalogRepository,
        P: PetRepository,
    {
        self.snapshot
            .failures
            .retain(|failure| failure.catalog != CatalogKind::Slots);
        match loader.load_available_slots().await {
            Ok(slots) => {
                debug!(offered = slots.len(), "slots reloaded after booking");
                self.snapshot.slots = slots;
            }
            Err(err) => {
                self.snapshot.slots.clear();
                self.snapshot.failures.push(err);
            }
        }
    }
}
