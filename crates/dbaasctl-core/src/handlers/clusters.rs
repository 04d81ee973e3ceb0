//! Cluster calls

use reqwest::StatusCode;
use tracing::info;

use crate::client::{ContentType, DbaasClient};
use crate::error::{CoreError, Result};
use crate::models::{
    CreateClusterRequest, CreateClusterResponse, Listing, StatusResponse, TableSpace,
};
use crate::step::Step;

pub struct ClusterHandler {
    client: DbaasClient,
}

impl ClusterHandler {
    pub fn new(client: DbaasClient) -> Self {
        Self { client }
    }

    /// `POST /api/clusters`, requires 201; returns the id of the first instance
    pub async fn create(&self, request: &CreateClusterRequest) -> Result<String> {
        let step = Step::CreateCluster;
        let response: CreateClusterResponse = self
            .client
            .post(step, "/api/clusters", request)
            .await?
            .expect_status(step, StatusCode::CREATED)?
            .json(step)?;

        let cluster_id = response
            .instances
            .into_iter()
            .next()
            .map(|instance| instance.cluster_id)
            .filter(|id| !id.is_empty())
            .ok_or(CoreError::EmptyListing {
                step,
                what: "cluster instances",
            })?;

        info!("Cluster created with ID: {}", cluster_id);
        Ok(cluster_id)
    }

    /// `GET /api/clusters/{id}`
    pub async fn status(&self, cluster_id: &str) -> Result<StatusResponse> {
        self.client
            .get_json(Step::AwaitCluster, &format!("/api/clusters/{}", cluster_id))
            .await
    }

    /// `GET /api/clusters/{id}/tablespaces`
    pub async fn tablespaces(&self, cluster_id: &str) -> Result<Vec<TableSpace>> {
        let listing: Listing<TableSpace> = self
            .client
            .get_json(
                Step::SelectTablespace,
                &format!("/api/clusters/{}/tablespaces", cluster_id),
            )
            .await?;
        Ok(listing.into_vec())
    }

    /// The default placement: first tablespace listed for the cluster
    pub async fn default_tablespace(&self, cluster_id: &str) -> Result<TableSpace> {
        self.tablespaces(cluster_id)
            .await?
            .into_iter()
            .next()
            .ok_or(CoreError::EmptyListing {
                step: Step::SelectTablespace,
                what: "tablespaces",
            })
    }

    /// `DELETE /api/clusters/{id}` with a wildcard content type, requires 204
    pub async fn delete(&self, cluster_id: &str) -> Result<()> {
        let step = Step::DeleteCluster;
        self.client
            .delete(
                step,
                &format!("/api/clusters/{}", cluster_id),
                ContentType::Any,
            )
            .await?
            .expect_status(step, StatusCode::NO_CONTENT)?;
        info!("Cluster {} deleted", cluster_id);
        Ok(())
    }
}
