//! Dump calls

use reqwest::StatusCode;
use tracing::info;

use crate::client::{ContentType, DbaasClient};
use crate::error::{CoreError, Result};
use crate::models::{CreateDumpRequest, CreatedResource, StatusResponse};
use crate::step::Step;

pub struct DumpHandler {
    client: DbaasClient,
}

impl DumpHandler {
    pub fn new(client: DbaasClient) -> Self {
        Self { client }
    }

    /// `POST /api/clusters/{id}/databases/{id}/dumps`, requires 201
    pub async fn create(&self, cluster_id: &str, database_id: &str, name: &str) -> Result<String> {
        let step = Step::CreateDump;
        let created: CreatedResource = self
            .client
            .post(
                step,
                &format!("/api/clusters/{}/databases/{}/dumps", cluster_id, database_id),
                &CreateDumpRequest { name },
            )
            .await?
            .expect_status(step, StatusCode::CREATED)?
            .json(step)?;

        if created.id.is_empty() {
            return Err(CoreError::EmptyListing {
                step,
                what: "dump id",
            });
        }
        info!("Dump created with ID: {}", created.id);
        Ok(created.id)
    }

    /// `GET /api/dumps/{id}`
    pub async fn status(&self, dump_id: &str) -> Result<StatusResponse> {
        self.status_in(Step::AwaitDump, dump_id).await
    }

    /// Dump status fetched on behalf of another step
    pub async fn status_in(&self, step: Step, dump_id: &str) -> Result<StatusResponse> {
        self.client
            .get_json(step, &format!("/api/dumps/{}", dump_id))
            .await
    }

    /// `DELETE /api/dumps/{id}`, requires 204
    pub async fn delete(&self, dump_id: &str) -> Result<()> {
        let step = Step::DeleteDump;
        self.client
            .delete(step, &format!("/api/dumps/{}", dump_id), ContentType::Json)
            .await?
            .expect_status(step, StatusCode::NO_CONTENT)?;
        info!("Dump {} deleted", dump_id);
        Ok(())
    }
}
