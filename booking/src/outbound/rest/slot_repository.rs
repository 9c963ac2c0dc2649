//! Slot availability writes over PostgREST.

use async_trait::async_trait;
use reqwest::Method;

use super::catalog_repository::SLOTS_TABLE;
use super::client::{RestClient, send_empty, send_json, table_error_from_http};
use super::dto::SlotAvailabilityDto;
use crate::domain::SlotId;
use crate::domain::ports::{SlotRepository, SlotRepositoryError};

const PREFER: &str = "Prefer";

table_error_from_http!(SlotRepositoryError);

/// Slot availability writes against `available_slots`.
#[derive(Clone)]
pub struct RestSlotRepository {
    client: RestClient,
}

impl RestSlotRepository {
    /// Read and write through `client`.
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SlotRepository for RestSlotRepository {
    async fn mark_unavailable(&self, slot_id: SlotId) -> Result<(), SlotRepositoryError> {
        let mut url = self.client.table_url(SLOTS_TABLE)?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{slot_id}"));

        let request = self
            .client
            .request(Method::PATCH, url)
            .await
            .header(PREFER, "return=minimal")
            .json(&SlotAvailabilityDto {
                is_available: false,
            });
        send_empty(request).await?;
        Ok(())
    }

    async fn claim_if_available(&self, slot_id: SlotId) -> Result<bool, SlotRepositoryError> {
        let mut url = self.client.table_url(SLOTS_TABLE)?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{slot_id}"))
            .append_pair("is_available", "eq.true")
            .append_pair("select", "id");

        let request = self
            .client
            .request(Method::PATCH, url)
            .await
            .header(PREFER, "return=representation")
            .json(&SlotAvailabilityDto {
                is_available: false,
            });
        let changed: Vec<serde_json::Value> = send_json(request).await?;
        Ok(!changed.is_empty())
    }
}
