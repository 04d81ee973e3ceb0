//! Database calls, including restore from a dump

use reqwest::StatusCode;
use tracing::info;

use crate::client::DbaasClient;
use crate::error::{CoreError, Result};
use crate::models::{
    CreateDatabaseRequest, CreatedResource, DatabaseEntry, Listing, RestoreDumpRequest,
    RestoreMode, StatusResponse,
};
use crate::step::Step;

pub struct DatabaseHandler {
    client: DbaasClient,
}

impl DatabaseHandler {
    pub fn new(client: DbaasClient) -> Self {
        Self { client }
    }

    /// `POST /api/clusters/{id}/databases`, requires 201
    pub async fn create(&self, cluster_id: &str, name: &str, tablespace_id: &str) -> Result<String> {
        let step = Step::CreateDatabase;
        let request = CreateDatabaseRequest {
            name,
            tablespace_id,
        };
        let created: CreatedResource = self
            .client
            .post(step, &format!("/api/clusters/{}/databases", cluster_id), &request)
            .await?
            .expect_status(step, StatusCode::CREATED)?
            .json(step)?;

        if created.id.is_empty() {
            return Err(CoreError::EmptyListing {
                step,
                what: "database id",
            });
        }
        info!("Database created with ID: {}", created.id);
        Ok(created.id)
    }

    /// `GET /api/clusters/{id}/databases/{id}`
    pub async fn status(&self, cluster_id: &str, database_id: &str) -> Result<StatusResponse> {
        self.status_in(Step::AwaitDatabase, cluster_id, database_id)
            .await
    }

    /// Database status fetched on behalf of another step (restore waits on it too)
    pub async fn status_in(
        &self,
        step: Step,
        cluster_id: &str,
        database_id: &str,
    ) -> Result<StatusResponse> {
        self.client
            .get_json(
                step,
                &format!("/api/clusters/{}/databases/{}", cluster_id, database_id),
            )
            .await
    }

    /// `GET /api/clusters/{id}/databases`
    pub async fn list(&self, cluster_id: &str) -> Result<Vec<DatabaseEntry>> {
        let listing: Listing<DatabaseEntry> = self
            .client
            .get_json(
                Step::FetchConnection,
                &format!("/api/clusters/{}/databases", cluster_id),
            )
            .await?;
        Ok(listing.into_vec())
    }

    /// `POST /api/clusters/{id}/databases/{id}/dump_restore`
    ///
    /// Full restore without database users. Any 2xx status means the restore was
    /// accepted; completion is observed by polling.
    pub async fn restore_dump(
        &self,
        cluster_id: &str,
        database_id: &str,
        dump_id: &str,
    ) -> Result<()> {
        let step = Step::Restore;
        let request = RestoreDumpRequest {
            dump_id,
            mode: RestoreMode::Full,
            restore_users: false,
        };
        self.client
            .post(
                step,
                &format!(
                    "/api/clusters/{}/databases/{}/dump_restore",
                    cluster_id, database_id
                ),
                &request,
            )
            .await?
            .expect_success(step)?;
        info!("Restore of dump {} into database {} started", dump_id, database_id);
        Ok(())
    }
}
