//! `users` profile lookup over PostgREST.

use async_trait::async_trait;
use reqwest::Method;

use super::client::{HttpFailure, RestClient, send_json, table_error_from_http};
use super::dto::ProfileRowDto;
use crate::domain::UserId;
use crate::domain::ports::{
    ProfileProjection, ProfileRecord, ProfileRepository, ProfileRepositoryError,
};

const USERS_TABLE: &str = "users";
const FULL_SELECT: &str = "role,name,pets(id,owner_id,name,species)";
const ROLE_SELECT: &str = "role";

table_error_from_http!(ProfileRepositoryError);

/// Reads profile rows from the `users` table.
///
/// The full projection embeds `pets` as a left join so owners without pets
/// still get their row.
#[derive(Clone)]
pub struct RestProfileRepository {
    client: RestClient,
}

impl RestProfileRepository {
    /// Read and write through `client`.
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProfileRepository for RestProfileRepository {
    async fn fetch_profile(
        &self,
        user_id: &UserId,
        projection: ProfileProjection,
    ) -> Result<Option<ProfileRecord>, ProfileRepositoryError> {
        let select = match projection {
            ProfileProjection::Full => FULL_SELECT,
            ProfileProjection::RoleOnly => ROLE_SELECT,
        };
        let mut url = self.client.table_url(USERS_TABLE)?;
        url.query_pairs_mut()
            .append_pair("select", select)
            .append_pair("id", &format!("eq.{user_id}"))
            .append_pair("limit", "1");

        let request = self.client.request(Method::GET, url).await;
        let rows: Vec<ProfileRowDto> = send_json(request).await?;
        rows.into_iter()
            .next()
            .map(|row| row.into_record().map_err(HttpFailure::decode))
            .transpose()
            .map_err(ProfileRepositoryError::from)
    }
}
