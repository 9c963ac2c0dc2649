//! `pets` listing over PostgREST.

use async_trait::async_trait;
use reqwest::Method;

use super::client::{HttpFailure, RestClient, send_json, table_error_from_http};
use super::dto::PetRowDto;
use crate::domain::ports::{PetRepository, PetRepositoryError};
use crate::domain::{Pet, UserId};

const PETS_TABLE: &str = "pets";

table_error_from_http!(PetRepositoryError);

/// Pet listing against the `pets` table.
#[derive(Clone)]
pub struct RestPetRepository {
    client: RestClient,
}

impl RestPetRepository {
    /// Read and write through `client`.
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PetRepository for RestPetRepository {
    async fn list_for_owner(&self, owner: &UserId) -> Result<Vec<Pet>, PetRepositoryError> {
        let mut url = self.client.table_url(PETS_TABLE)?;
        url.query_pairs_mut()
            .append_pair("select", "id,owner_id,name,species")
            .append_pair("owner_id", &format!("eq.{owner}"))
            .append_pair("order", "id.asc");

        let request = self.client.request(Method::GET, url).await;
        let rows: Vec<PetRowDto> = send_json(request).await?;
        rows.into_iter()
            .map(|row| row.into_pet().map_err(HttpFailure::decode))
            .collect::<Result<Vec<_>, _>>()
            .map_err(PetRepositoryError::from)
    }
}
