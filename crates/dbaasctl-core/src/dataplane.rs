//! SQL side of the run
//!
//! The workflow talks to the provisioned database through the [`DataPlane`] trait:
//! create the schema and table, seed rows, truncate, read back. [`PgDataPlane`]
//! implements it over a single `sqlx` Postgres connection that is opened once and
//! held until the workflow closes it.
//!
//! Table and schema names are formatted into the SQL, so callers must pass
//! identifiers validated by [`WorkflowSettings::validate`](crate::config::WorkflowSettings::validate).
//! Row values always go through bind parameters.

use async_trait::async_trait;
use rand::Rng;
use serde::Serialize;
use sqlx::{Connection, FromRow, PgConnection};
use tracing::{debug, info};

use crate::connection::ConnectionString;
use crate::error::{CoreError, Result};
use crate::step::Step;

/// Youngest generated age
const MIN_AGE: i32 = 18;
/// Oldest generated age
const MAX_AGE: i32 = 67;

/// A row the workflow inserts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedRow {
    pub name: String,
    pub email: String,
    pub age: i32,
}

/// A row read back from the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct UserRow {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub age: Option<i32>,
}

impl SeedRow {
    /// Row `n` of the seed set: `Пользователь n`, `usern@example.com`, random age
    pub fn generate(n: u32, rng: &mut impl Rng) -> Self {
        Self {
            name: format!("Пользователь {}", n),
            email: format!("user{}@example.com", n),
            age: rng.gen_range(MIN_AGE..=MAX_AGE),
        }
    }

    /// Rows `1..=count`
    pub fn generate_set(count: u32) -> Vec<Self> {
        let mut rng = rand::thread_rng();
        (1..=count).map(|n| Self::generate(n, &mut rng)).collect()
    }

    /// True if `row` carries this seed's name and email
    pub fn matches(&self, row: &UserRow) -> bool {
        self.name == row.name && self.email == row.email
    }
}

/// Operations the workflow runs against the provisioned database
#[async_trait]
pub trait DataPlane: Send {
    /// `CREATE SCHEMA IF NOT EXISTS`
    async fn ensure_schema(&mut self, schema: &str) -> Result<()>;

    /// `CREATE TABLE IF NOT EXISTS` for the seeded table
    async fn ensure_table(&mut self, table: &str) -> Result<()>;

    async fn insert_row(&mut self, table: &str, row: &SeedRow) -> Result<()>;

    async fn truncate(&mut self, table: &str) -> Result<()>;

    /// All rows ordered by id
    async fn fetch_rows(&mut self, table: &str) -> Result<Vec<UserRow>>;

    /// Release the connection
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Opens a [`DataPlane`] for a resolved connection string
#[async_trait]
pub trait DataPlaneConnector: Send + Sync {
    async fn connect(&self, connection: &ConnectionString) -> Result<Box<dyn DataPlane>>;
}

/// Postgres data plane over one `sqlx` connection
pub struct PgDataPlane {
    conn: PgConnection,
}

impl PgDataPlane {
    pub async fn connect(connection: &ConnectionString) -> Result<Self> {
        debug!("Connecting to {}", connection);
        let conn = PgConnection::connect(connection.expose())
            .await
            .map_err(|e| CoreError::data_plane(Step::Populate, e))?;
        info!("Connected to provisioned database");
        Ok(Self { conn })
    }

    async fn run(&mut self, step: Step, sql: &str) -> Result<()> {
        sqlx::query(sql)
            .execute(&mut self.conn)
            .await
            .map_err(|e| CoreError::data_plane(step, e))?;
        Ok(())
    }
}

#[async_trait]
impl DataPlane for PgDataPlane {
    async fn ensure_schema(&mut self, schema: &str) -> Result<()> {
        self.run(
            Step::Populate,
            &format!("CREATE SCHEMA IF NOT EXISTS {}", schema),
        )
        .await?;
        info!("Schema {} created", schema);
        Ok(())
    }

    async fn ensure_table(&mut self, table: &str) -> Result<()> {
        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id SERIAL PRIMARY KEY,
                name VARCHAR(100) NOT NULL,
                email VARCHAR(100) NOT NULL,
                age INT,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            table
        );
        self.run(Step::Populate, &sql).await?;
        info!("Table {} created", table);
        Ok(())
    }

    async fn insert_row(&mut self, table: &str, row: &SeedRow) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (name, email, age) VALUES ($1, $2, $3)",
            table
        );
        sqlx::query(&sql)
            .bind(&row.name)
            .bind(&row.email)
            .bind(row.age)
            .execute(&mut self.conn)
            .await
            .map_err(|e| CoreError::data_plane(Step::Populate, e))?;
        Ok(())
    }

    async fn truncate(&mut self, table: &str) -> Result<()> {
        self.run(Step::Truncate, &format!("TRUNCATE TABLE {}", table))
            .await?;
        info!("Table {} truncated", table);
        Ok(())
    }

    async fn fetch_rows(&mut self, table: &str) -> Result<Vec<UserRow>> {
        let sql = format!("SELECT id, name, email, age FROM {} ORDER BY id", table);
        sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| CoreError::data_plane(Step::Verify, e))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| CoreError::data_plane(Step::Verify, e))?;
        debug!("Database connection closed");
        Ok(())
    }
}

/// Connector for real Postgres databases
#[derive(Debug, Clone, Copy, Default)]
pub struct PgConnector;

#[async_trait]
impl DataPlaneConnector for PgConnector {
    async fn connect(&self, connection: &ConnectionString) -> Result<Box<dyn DataPlane>> {
        Ok(Box::new(PgDataPlane::connect(connection).await?))
    }
}
