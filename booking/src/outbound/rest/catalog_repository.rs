//! `services` and `available_slots` reads over PostgREST.

use async_trait::async_trait;
use reqwest::Method;

use super::client::{RestClient, send_json, table_error_from_http};
use super::dto::{ServiceRowDto, SlotRowDto};
use crate::domain::ports::{CatalogRepository, CatalogRepositoryError};
use crate::domain::{Service, Slot};

const SERVICES_TABLE: &str = "services";
pub(super) const SLOTS_TABLE: &str = "available_slots";

table_error_from_http!(CatalogRepositoryError);

/// Reads the `services` and `available_slots` tables.
#[derive(Clone)]
pub struct RestCatalogRepository {
    client: RestClient,
}

impl RestCatalogRepository {
    /// Read and write through `client`.
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CatalogRepository for RestCatalogRepository {
    async fn list_services(&self) -> Result<Vec<Service>, CatalogRepositoryError> {
        let mut url = self.client.table_url(SERVICES_TABLE)?;
        url.query_pairs_mut().append_pair("select", "id,description");

        let request = self.client.request(Method::GET, url).await;
        let rows: Vec<ServiceRowDto> = send_json(request).await?;
        Ok(rows.into_iter().map(Service::from).collect())
    }

    async fn list_available_slots(&self) -> Result<Vec<Slot>, CatalogRepositoryError> {
        let mut url = self.client.table_url(SLOTS_TABLE)?;
        url.query_pairs_mut()
            .append_pair("select", "id,date,start_time,is_available")
            .append_pair("is_available", "eq.true")
            .append_pair("order", "date.asc,start_time.asc");

        let request = self.client.request(Method::GET, url).await;
        let rows: Vec<SlotRowDto> = send_json(request).await?;
        Ok(rows.into_iter().map(Slot::from).collect())
    }
}
