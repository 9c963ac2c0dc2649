//! Appointment inserts over PostgREST.

use async_trait::async_trait;
use reqwest::Method;

use super::client::{HttpFailure, RestClient, send_json, table_error_from_http};
use super::dto::{AppointmentRowDto, NewAppointmentDto};
use crate::domain::ports::{AppointmentRepository, AppointmentRepositoryError};
use crate::domain::{Appointment, NewAppointment};

table_error_from_http!(AppointmentRepositoryError);

/// Inserts into the configured appointments table.
#[derive(Clone)]
pub struct RestAppointmentRepository {
    client: RestClient,
    table: String,
}

impl RestAppointmentRepository {
    /// Insert into `table` through `client`.
    pub fn new(client: RestClient, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

#[async_trait]
impl AppointmentRepository for RestAppointmentRepository {
    async fn insert(
        &self,
        appointment: &NewAppointment,
    ) -> Result<Appointment, AppointmentRepositoryError> {
        let mut url = self.client.table_url(&self.table)?;
        url.query_pairs_mut()
            .append_pair("select", "id,pets_id,services_id,slot_id");

        let request = self
            .client
            .request(Method::POST, url)
            .await
            .header("Prefer", "return=representation")
            .json(&NewAppointmentDto::from(appointment));
        let rows: Vec<AppointmentRowDto> = send_json(request).await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| HttpFailure::decode("insert returned no row"))?;
        Ok(Appointment::from(row))
    }
}
