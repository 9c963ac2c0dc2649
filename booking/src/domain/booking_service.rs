//! The booking workflow: one appointment row plus one slot flip.
//!
//! In [`BookingMode::TwoStep`] the two writes are independent. If the slot
//! update fails after the insert, the appointment stays and the slot remains
//! offered; that window is reported through
//! [`BookingError::SlotUpdate`] and never repaired here.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::ports::{AppointmentRepository, SlotRepository};
use crate::domain::{
    Appointment, BookingError, BookingMode, BookingSelection, Identity, NewAppointment, Pet,
};

/// Books appointments against the appointment and slot tables.
pub struct BookingWorkflow<A, S> {
    appointments: Arc<A>,
    slots: Arc<S>,
    mode: BookingMode,
}

impl<A, S> Clone for BookingWorkflow<A, S> {
    fn clone(&self) -> Self {
        Self {
            appointments: Arc::clone(&self.appointments),
            slots: Arc::clone(&self.slots),
            mode: self.mode,
        }
    }
}

impl<A, S> BookingWorkflow<A, S> {
    /// Build a workflow over the appointment and slot ports.
    pub fn new(appointments: Arc<A>, slots: Arc<S>, mode: BookingMode) -> Self {
        Self {
            appointments,
            slots,
            mode,
        }
    }

    /// The mode every booking runs in.
    pub fn mode(&self) -> BookingMode {
        self.mode
    }
}

impl<A, S> BookingWorkflow<A, S>
where
    A: AppointmentRepository,
    S: SlotRepository,
{
    /// Book `selection` for `owner`.
    ///
    /// The pet must appear in the owner's resolved pets or in `pets`, with
    /// `owner_id` matching the owner.
    pub async fn book(
        &self,
        owner: &Identity,
        pets: &[Pet],
        selection: &BookingSelection,
    ) -> Result<Appointment, BookingError> {
        let pet_id = selection.pet_id();
        let owns_pet = owner
            .pets()
            .iter()
            .chain(pets)
            .any(|pet| pet.id == pet_id && &pet.owner_id == owner.id());
        if !owns_pet {
            warn!(user_id = %owner.id(), %pet_id, "booking rejected: pet not owned");
            return Err(BookingError::PetNotOwned { pet_id });
        }

        match self.mode {
            BookingMode::TwoStep => self.insert_then_flip(selection).await,
            BookingMode::Conditional => self.claim_then_insert(selection).await,
        }
    }

    async fn insert_then_flip(
        &self,
        selection: &BookingSelection,
    ) -> Result<Appointment, BookingError> {
        let slot_id = selection.slot_id();
        let appointment = self
            .appointments
            .insert(&NewAppointment::from(selection))
            .await
            .map_err(|source| {
                warn!(%slot_id, error = %source, "appointment insert failed");
                BookingError::AppointmentInsert {
                    claimed_slot: None,
                    source,
                }
            })?;

        if let Err(source) = self.slots.mark_unavailable(slot_id).await {
            warn!(
                %slot_id,
                appointment_id = %appointment.id,
                error = %source,
                "slot update failed; appointment references a slot still marked available"
            );
            return Err(BookingError::SlotUpdate {
                slot_id,
                appointment_id: Some(appointment.id),
                source,
            });
        }

        info!(%slot_id, appointment_id = %appointment.id, "appointment booked");
        Ok(appointment)
    }

    async fn claim_then_insert(
        &self,
        selection: &BookingSelection,
    ) -> Result<Appointment, BookingError> {
        let slot_id = selection.slot_id();
        let claimed = self
            .slots
            .claim_if_available(slot_id)
            .await
            .map_err(|source| {
                warn!(%slot_id, error = %source, "slot claim failed");
                BookingError::SlotUpdate {
                    slot_id,
                    appointment_id: None,
                    source,
                }
            })?;
        if !claimed {
            info!(%slot_id, "slot already booked");
            return Err(BookingError::SlotAlreadyTaken { slot_id });
        }

        let appointment = self
            .appointments
            .insert(&NewAppointment::from(selection))
            .await
            .map_err(|source| {
                warn!(%slot_id, error = %source, "appointment insert failed after claiming slot");
                BookingError::AppointmentInsert {
                    claimed_slot: Some(slot_id),
                    source,
                }
            })?;

        info!(%slot_id, appointment_id = %appointment.id, "appointment booked");
        Ok(appointment)
    }
}

#[cfg(test)]
#[path = "booking_service_tests.rs"]
mod tests;
