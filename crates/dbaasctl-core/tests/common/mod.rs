//! Shared fixtures: a mock control plane and an in-memory data plane
//!
//! The mock's dump and restore endpoints share state with the in-memory
//! database, so a dump captures the seeded rows and a restore brings them back.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dbaasctl_core::connection::ConnectionString;
use dbaasctl_core::{
    Credentials, DataPlane, DataPlaneConnector, DbaasClient, ReadinessPolicy, Result, SeedRow,
    UserRow, WorkflowSettings,
};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const TOKEN: &str = "token-123";
pub const CLUSTER_ID: &str = "cluster-1";
pub const DATABASE_ID: &str = "db-1";
pub const DUMP_ID: &str = "dump-1";
pub const TYPE_ID: &str = "type-pg15";
pub const FLAVOR_ID: &str = "flavor-small";
pub const LOGIN: &str = "operator";
pub const PASSWORD: &str = "s3cret";
pub const CONNECTION_TEMPLATE: &str = "postgres://<username>:<password>@db.example.com:5432/testDB";

/// Rows as stored by the in-memory database
#[derive(Debug, Default)]
pub struct MemoryDb {
    pub schemas: Vec<String>,
    pub tables: Vec<String>,
    pub rows: Vec<UserRow>,
    pub next_id: i32,
    pub snapshot: Option<Vec<UserRow>>,
    pub connection: Option<String>,
    pub closed: bool,
}

pub type SharedDb = Arc<Mutex<MemoryDb>>;

/// Control-plane mock wired to an in-memory database
pub struct MockDbaasServer {
    pub server: MockServer,
    pub db: SharedDb,
}

impl MockDbaasServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
            db: SharedDb::default(),
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.uri(), LOGIN, PASSWORD)
    }

    pub fn client(&self) -> DbaasClient {
        DbaasClient::new(self.uri())
    }

    pub fn authorized_client(&self) -> DbaasClient {
        self.client().with_token(TOKEN)
    }

    pub fn connector(&self) -> MemoryConnector {
        MemoryConnector {
            db: Arc::clone(&self.db),
            panic_on_insert: false,
        }
    }

    pub async fn mock_authorize(&self) {
        Mock::given(method("POST"))
            .and(path("/api/authorize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "refresh_token": TOKEN
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_catalog(&self) {
        Mock::given(method("GET"))
            .and(path("/api/types"))
            .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "type-pg14", "version": "14", "name": "Postgres Pro Enterprise"},
                {"id": TYPE_ID, "version": "15", "name": "Postgres Pro Enterprise"}
            ])))
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/flavors"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {"id": "flavor-tiny", "name": "s1.tiny", "cpu": 1, "ram": 1073741824u64},
                    {"id": FLAVOR_ID, "name": "s1.small", "cpu": 2, "ram": 4294967296u64}
                ]
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_create_cluster(&self) {
        Mock::given(method("POST"))
            .and(path("/api/clusters"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "instances": [{"cluster_id": CLUSTER_ID}]
            })))
            .mount(&self.server)
            .await;
    }

    /// Status endpoint reporting `pending` for the first `pending_checks` calls, then `OK`
    pub async fn mock_status(&self, status_path: &str, pending: &str, pending_checks: u64) {
        if pending_checks > 0 {
            Mock::given(method("GET"))
                .and(path(status_path))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(json!({"status": pending})),
                )
                .up_to_n_times(pending_checks)
                .with_priority(1)
                .mount(&self.server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path(status_path))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "OK"})))
            .mount(&self.server)
            .await;
    }

    /// Status endpoint that never reports ready
    pub async fn mock_status_stuck(&self, status_path: &str, status: &str) {
        Mock::given(method("GET"))
            .and(path(status_path))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": status})))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_tablespaces(&self) {
        Mock::given(method("GET"))
            .and(path(format!("/api/clusters/{}/tablespaces", CLUSTER_ID)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "ts-default", "name": "pg_default"},
                {"id": "ts-fast", "name": "fast_ssd"}
            ])))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_create_database(&self) {
        Mock::given(method("POST"))
            .and(path(format!("/api/clusters/{}/databases", CLUSTER_ID)))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": DATABASE_ID})))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_create_user(&self) {
        Mock::given(method("POST"))
            .and(path(format!("/api/clusters/{}/users", CLUSTER_ID)))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_list_databases(&self) {
        Mock::given(method("GET"))
            .and(path(format!("/api/clusters/{}/databases", CLUSTER_ID)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": DATABASE_ID,
                "name": "testDB",
                "master_connection_string": CONNECTION_TEMPLATE
            }])))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_create_dump(&self) {
        Mock::given(method("POST"))
            .and(path(format!(
                "/api/clusters/{}/databases/{}/dumps",
                CLUSTER_ID, DATABASE_ID
            )))
            .respond_with(SnapshotOnDump {
                db: Arc::clone(&self.db),
            })
            .mount(&self.server)
            .await;
    }

    pub async fn mock_restore(&self) {
        Mock::given(method("POST"))
            .and(path(format!(
                "/api/clusters/{}/databases/{}/dump_restore",
                CLUSTER_ID, DATABASE_ID
            )))
            .respond_with(RestoreFromSnapshot {
                db: Arc::clone(&self.db),
            })
            .mount(&self.server)
            .await;
    }

    pub async fn mock_delete_dump(&self, status: u16) {
        Mock::given(method("DELETE"))
            .and(path(format!("/api/dumps/{}", DUMP_ID)))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_delete_cluster(&self, status: u16) {
        Mock::given(method("DELETE"))
            .and(path(format!("/api/clusters/{}", CLUSTER_ID)))
            .and(header("content-type", "*/*"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Every endpoint of a successful run; clusters start out pending
    pub async fn mock_happy_path(&self) {
        self.mock_authorize().await;
        self.mock_catalog().await;
        self.mock_create_cluster().await;
        self.mock_status(&format!("/api/clusters/{}", CLUSTER_ID), "PENDING", 1)
            .await;
        self.mock_tablespaces().await;
        self.mock_create_database().await;
        self.mock_status(
            &format!("/api/clusters/{}/databases/{}", CLUSTER_ID, DATABASE_ID),
            "CREATING",
            1,
        )
        .await;
        self.mock_create_user().await;
        self.mock_list_databases().await;
        self.mock_create_dump().await;
        self.mock_status(&format!("/api/dumps/{}", DUMP_ID), "IN_PROGRESS", 1)
            .await;
        self.mock_restore().await;
        self.mock_delete_dump(204).await;
        self.mock_delete_cluster(204).await;
    }

    /// Requests received so far as `METHOD path`
    pub async fn requests(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| format!("{} {}", r.method, r.url.path()))
            .collect()
    }

    /// JSON body of the first `method path` request received
    pub async fn request_body(&self, method: &str, path: &str) -> Option<serde_json::Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .find(|r| r.method.as_str() == method && r.url.path() == path)
            .and_then(|r| serde_json::from_slice(&r.body).ok())
    }

    pub async fn count(&self, method: &str, path: &str) -> usize {
        let wanted = format!("{} {}", method, path);
        self.requests()
            .await
            .iter()
            .filter(|r| **r == wanted)
            .count()
    }
}

/// Settings with no delay between status checks
pub fn fast_settings() -> WorkflowSettings {
    WorkflowSettings {
        max_attempts: 5,
        interval_secs: 0,
        on_timeout: ReadinessPolicy::Proceed,
        ..WorkflowSettings::default()
    }
}

struct SnapshotOnDump {
    db: SharedDb,
}

impl Respond for SnapshotOnDump {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let mut db = self.db.lock().unwrap();
        db.snapshot = Some(db.rows.clone());
        ResponseTemplate::new(201).set_body_json(json!({"id": DUMP_ID}))
    }
}

struct RestoreFromSnapshot {
    db: SharedDb,
}

impl Respond for RestoreFromSnapshot {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let mut db = self.db.lock().unwrap();
        if let Some(rows) = db.snapshot.clone() {
            db.rows = rows;
        }
        ResponseTemplate::new(200).set_body_json(json!({"status": "accepted"}))
    }
}

/// Opens [`MemoryPlane`]s over a shared [`MemoryDb`]
pub struct MemoryConnector {
    pub db: SharedDb,
    pub panic_on_insert: bool,
}

#[async_trait]
impl DataPlaneConnector for MemoryConnector {
    async fn connect(&self, connection: &ConnectionString) -> Result<Box<dyn DataPlane>> {
        self.db.lock().unwrap().connection = Some(connection.expose().to_string());
        Ok(Box::new(MemoryPlane {
            db: Arc::clone(&self.db),
            panic_on_insert: self.panic_on_insert,
        }))
    }
}

pub struct MemoryPlane {
    db: SharedDb,
    panic_on_insert: bool,
}

#[async_trait]
impl DataPlane for MemoryPlane {
    async fn ensure_schema(&mut self, schema: &str) -> Result<()> {
        self.db.lock().unwrap().schemas.push(schema.to_string());
        Ok(())
    }

    async fn ensure_table(&mut self, table: &str) -> Result<()> {
        self.db.lock().unwrap().tables.push(table.to_string());
        Ok(())
    }

    async fn insert_row(&mut self, _table: &str, row: &SeedRow) -> Result<()> {
        if self.panic_on_insert {
            panic!("data plane crashed");
        }
        let mut db = self.db.lock().unwrap();
        db.next_id += 1;
        let id = db.next_id;
        db.rows.push(UserRow {
            id,
            name: row.name.clone(),
            email: row.email.clone(),
            age: Some(row.age),
        });
        Ok(())
    }

    async fn truncate(&mut self, _table: &str) -> Result<()> {
        self.db.lock().unwrap().rows.clear();
        Ok(())
    }

    async fn fetch_rows(&mut self, _table: &str) -> Result<Vec<UserRow>> {
        Ok(self.db.lock().unwrap().rows.clone())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.db.lock().unwrap().closed = true;
        Ok(())
    }
}
