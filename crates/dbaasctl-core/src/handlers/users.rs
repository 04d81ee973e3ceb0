//! Database user calls

use reqwest::StatusCode;
use tracing::info;

use crate::client::DbaasClient;
use crate::error::Result;
use crate::models::{CreateUserRequest, USER_ROLES};
use crate::step::Step;

pub struct UserHandler {
    client: DbaasClient,
}

impl UserHandler {
    pub fn new(client: DbaasClient) -> Self {
        Self { client }
    }

    /// `POST /api/clusters/{id}/users`, requires 201
    ///
    /// The user gets read-all and write-all roles on the listed databases.
    /// Creation is synchronous; nothing to poll.
    pub async fn create(
        &self,
        cluster_id: &str,
        name: &str,
        password: &str,
        databases: &[&str],
    ) -> Result<()> {
        let step = Step::CreateUser;
        let request = CreateUserRequest {
            databases: databases.to_vec(),
            roles: USER_ROLES.to_vec(),
            name,
            password,
        };
        self.client
            .post(step, &format!("/api/clusters/{}/users", cluster_id), &request)
            .await?
            .expect_status(step, StatusCode::CREATED)?;
        info!("Database user '{}' created", name);
        Ok(())
    }
}
