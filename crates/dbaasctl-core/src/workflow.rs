//! The provisioning run
//!
//! [`ProvisioningWorkflow::run`] drives the lifecycle in order:
//!
//! 1. authenticate
//! 2. resolve the cluster type and flavor ids
//! 3. create the cluster and 4. wait for it
//! 5. pick the first tablespace, 6. create the database and 7. wait for it
//! 8. create the database user
//! 9. fetch the connection template and substitute the user's credentials
//! 10. create the schema and table and seed the rows
//! 11. create a dump and 12. wait for it
//! 13. truncate the table
//! 14. restore the dump, then wait for the dump and the database
//! 15. read the table back and compare it with what was seeded
//!
//! All state lives in a [`RunContext`] owned by the call. The steps run inside a
//! guarded future; whatever happens to them, including a panic, the data-plane
//! connection is closed and every created resource is handed to
//! [`teardown`](crate::teardown::teardown) before `run` returns.

use futures::FutureExt;
use serde::Serialize;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::catalog::CatalogLookup;
use crate::client::DbaasClient;
use crate::config::WorkflowSettings;
use crate::connection::{ConnectionDescriptor, ConnectionString};
use crate::dataplane::{DataPlane, DataPlaneConnector, PgConnector, SeedRow, UserRow};
use crate::error::{CoreError, Result};
use crate::handlers::{ClusterHandler, DatabaseHandler, DumpHandler, UserHandler};
use crate::models::{CreateClusterRequest, StatusResponse};
use crate::progress::{PollPolicy, ProgressCallback, ResourceKind, poll_until};
use crate::session::{Credentials, Session, authorize};
use crate::step::Step;
use crate::teardown::{CreatedResources, TeardownReport, teardown};

/// Summary of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub cluster_id: String,
    pub database_id: String,
    pub dump_id: String,
    /// Rows seeded before the dump
    pub inserted: usize,
    /// Rows found after the restore
    pub restored: usize,
    pub teardown: TeardownReport,
}

/// Mutable state of one run
#[derive(Default)]
struct RunContext {
    session: Option<Session>,
    resources: CreatedResources,
    database_id: Option<String>,
    data_plane: Option<Box<dyn DataPlane>>,
    inserted: Vec<SeedRow>,
    restored: usize,
}

impl RunContext {
    fn data_plane(&mut self, step: Step) -> Result<&mut Box<dyn DataPlane>> {
        self.data_plane.as_mut().ok_or_else(|| {
            CoreError::data_plane(step, "database connection is not open")
        })
    }
}

/// Full provisioning lifecycle against one control plane
pub struct ProvisioningWorkflow {
    settings: WorkflowSettings,
    credentials: Credentials,
    client: DbaasClient,
    connector: Arc<dyn DataPlaneConnector>,
    on_progress: Option<ProgressCallback>,
}

impl ProvisioningWorkflow {
    /// Workflow against the credentials' base URL, seeding a real Postgres database
    pub fn new(credentials: Credentials, settings: WorkflowSettings) -> Self {
        let client = DbaasClient::new(credentials.base_url());
        Self {
            settings,
            credentials,
            client,
            connector: Arc::new(PgConnector),
            on_progress: None,
        }
    }

    /// Use a preconfigured client instead of one built from the base URL
    pub fn with_client(mut self, client: DbaasClient) -> Self {
        self.client = client;
        self
    }

    /// Open data-plane connections through `connector`
    pub fn with_connector(mut self, connector: impl DataPlaneConnector + 'static) -> Self {
        self.connector = Arc::new(connector);
        self
    }

    /// Receive polling progress events
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Run every step, then tear down whatever was created
    ///
    /// A step failure is returned even if teardown also failed; teardown
    /// failures are logged in that case. On an otherwise successful run a
    /// teardown failure is returned as [`CoreError::Teardown`].
    pub async fn run(&self) -> Result<RunReport> {
        self.settings.validate()?;

        let mut ctx = RunContext::default();
        let outcome = AssertUnwindSafe(self.execute(&mut ctx))
            .catch_unwind()
            .await;

        if let Some(data_plane) = ctx.data_plane.take()
            && let Err(e) = data_plane.close().await
        {
            warn!("Failed to close database connection: {}", e);
        }

        let report = teardown(ctx.session.as_ref(), &ctx.resources).await;

        match outcome {
            Err(panic) => std::panic::resume_unwind(panic),
            Ok(Err(e)) => {
                if !report.is_clean() {
                    error!(
                        "Teardown after failed run left resources behind: {}",
                        report.failures.join("; ")
                    );
                }
                Err(e)
            }
            Ok(Ok(())) => {
                let teardown = report.into_result()?;
                let (Some(cluster_id), Some(dump_id), Some(database_id)) = (
                    ctx.resources.cluster_id,
                    ctx.resources.dump_id,
                    ctx.database_id,
                ) else {
                    return Err(CoreError::Verification(
                        "run finished without recording its resources".to_string(),
                    ));
                };
                Ok(RunReport {
                    cluster_id,
                    database_id,
                    dump_id,
                    inserted: ctx.inserted.len(),
                    restored: ctx.restored,
                    teardown,
                })
            }
        }
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<()> {
        let settings = &self.settings;
        let table = settings.qualified_table();

        let session = authorize(&self.client, &self.credentials).await?;
        let client = session.client().clone();
        ctx.session = Some(session);

        let catalog = CatalogLookup::new(client.clone());
        let type_id = catalog.resolve_type_id(&settings.type_version).await?;
        let flavor_id = catalog.resolve_flavor_id(&settings.flavor_name).await?;

        let clusters = ClusterHandler::new(client.clone());
        let request = CreateClusterRequest::from_spec(&settings.cluster, type_id, flavor_id);
        let cluster_id = clusters.create(&request).await?;
        ctx.resources.cluster_id = Some(cluster_id.clone());

        self.await_ready(Step::AwaitCluster, ResourceKind::Cluster, &cluster_id, || {
            clusters.status(&cluster_id)
        })
        .await?;

        let tablespace = clusters.default_tablespace(&cluster_id).await?;
        info!("Using tablespace {}", tablespace.id);

        let databases = DatabaseHandler::new(client.clone());
        let database_id = databases
            .create(&cluster_id, &settings.database_name, &tablespace.id)
            .await?;
        ctx.database_id = Some(database_id.clone());

        self.await_ready(Step::AwaitDatabase, ResourceKind::Database, &database_id, || {
            databases.status(&cluster_id, &database_id)
        })
        .await?;

        let (user, password) = self.database_user();
        UserHandler::new(client.clone())
            .create(&cluster_id, user, password, &[settings.database_name.as_str()])
            .await?;

        let connection = self
            .connection_string(&databases, &cluster_id, user, password)
            .await?;

        ctx.data_plane = Some(self.connector.connect(&connection).await?);
        let rows = SeedRow::generate_set(settings.rows);
        {
            let data_plane = ctx.data_plane(Step::Populate)?;
            data_plane.ensure_schema(&settings.schema).await?;
            data_plane.ensure_table(&table).await?;
            for row in &rows {
                data_plane.insert_row(&table, row).await?;
            }
        }
        info!("Inserted {} rows into {}", rows.len(), table);
        ctx.inserted = rows;

        let dumps = DumpHandler::new(client.clone());
        let dump_id = dumps
            .create(&cluster_id, &database_id, &settings.dump_name)
            .await?;
        ctx.resources.dump_id = Some(dump_id.clone());

        self.await_ready(Step::AwaitDump, ResourceKind::Dump, &dump_id, || {
            dumps.status(&dump_id)
        })
        .await?;

        ctx.data_plane(Step::Truncate)?.truncate(&table).await?;

        databases
            .restore_dump(&cluster_id, &database_id, &dump_id)
            .await?;
        self.await_ready(Step::Restore, ResourceKind::Dump, &dump_id, || {
            dumps.status_in(Step::Restore, &dump_id)
        })
        .await?;
        self.await_ready(Step::Restore, ResourceKind::Database, &database_id, || {
            databases.status_in(Step::Restore, &cluster_id, &database_id)
        })
        .await?;

        let restored = ctx.data_plane(Step::Verify)?.fetch_rows(&table).await?;
        ctx.restored = restored.len();
        verify_restored(&ctx.inserted, &restored)?;
        info!("Verified {} restored rows", restored.len());

        Ok(())
    }

    /// Poll a resource's status and apply the readiness policy on behalf of `step`
    async fn await_ready<F, Fut>(
        &self,
        step: Step,
        resource: ResourceKind,
        id: &str,
        fetch: F,
    ) -> Result<StatusResponse>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<StatusResponse>>,
    {
        let policy = PollPolicy::from_settings(&self.settings);
        debug!(
            "{}: waiting up to {:?} for {} {}",
            step,
            policy.budget(),
            resource,
            id
        );
        poll_until(
            &policy,
            resource,
            id,
            fetch,
            StatusResponse::is_ready,
            self.on_progress.as_ref(),
        )
        .await?
        .require(step, resource, id, self.settings.on_timeout)
    }

    /// Database user credentials, falling back to the operator's
    fn database_user(&self) -> (&str, &str) {
        (
            self.settings
                .user_name
                .as_deref()
                .unwrap_or(self.credentials.login()),
            self.settings
                .user_password
                .as_deref()
                .unwrap_or(self.credentials.password()),
        )
    }

    /// First database's master connection template with credentials filled in
    async fn connection_string(
        &self,
        databases: &DatabaseHandler,
        cluster_id: &str,
        user: &str,
        password: &str,
    ) -> Result<ConnectionString> {
        let entry = databases
            .list(cluster_id)
            .await?
            .into_iter()
            .next()
            .ok_or(CoreError::EmptyListing {
                step: Step::FetchConnection,
                what: "databases",
            })?;
        Ok(ConnectionDescriptor::from_template(entry.master_connection_string)
            .resolve(user, password))
    }
}

/// Restored rows must be exactly the seeded rows
fn verify_restored(inserted: &[SeedRow], restored: &[UserRow]) -> Result<()> {
    if restored.len() != inserted.len() {
        return Err(CoreError::Verification(format!(
            "expected {} rows after restore, found {}",
            inserted.len(),
            restored.len()
        )));
    }
    // Pair rows after sorting both sides so each seed is matched exactly once
    let mut expected: Vec<&SeedRow> = inserted.iter().collect();
    let mut actual: Vec<&UserRow> = restored.iter().collect();
    expected.sort_by(|a, b| (&a.name, &a.email).cmp(&(&b.name, &b.email)));
    actual.sort_by(|a, b| (&a.name, &a.email).cmp(&(&b.name, &b.email)));

    if let Some((seed, row)) = expected
        .iter()
        .zip(&actual)
        .find(|(seed, row)| !seed.matches(row))
    {
        return Err(CoreError::Verification(format!(
            "restored row {} ('{}', '{}') does not match inserted row ('{}', '{}')",
            row.id, row.name, row.email, seed.name, seed.email
        )));
    }
    Ok(())
}
