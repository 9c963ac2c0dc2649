//! Write-side port for appointment rows.
//!
//! Rows are inserted once per successful booking and never updated. The table
//! itself does not enforce one appointment per slot.

use async_trait::async_trait;

use crate::domain::{Appointment, NewAppointment};

use super::define_port_error;

define_port_error! {
    /// Errors raised when inserting appointments.
    pub enum AppointmentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "appointment insert connection failed: {message}",
        /// The insert was rejected or its result could not be read.
        Query { message: String } => "appointment insert failed: {message}",
    }
}

/// Port for creating appointment rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Insert a row and return it with its assigned id.
    async fn insert(
        &self,
        appointment: &NewAppointment,
    ) -> Result<Appointment, AppointmentRepositoryError>;
}
