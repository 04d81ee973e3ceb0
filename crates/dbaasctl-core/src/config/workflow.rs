//! Workflow settings stored under the `[workflow]` table
//!
//! Everything here has a default, so an empty table (or none at all) describes the
//! standard run: a single-replica Postgres Pro Enterprise cluster, a `testDB`
//! database, ten seeded rows, and readiness checks every 5 seconds for at most 30
//! attempts.

use super::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What to do when a readiness poll runs out of attempts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessPolicy {
    /// Log a warning and carry on with the next step
    #[default]
    Proceed,
    /// Abort the run with a readiness error
    Fail,
}

/// Settings that shape a provisioning run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSettings {
    /// Maximum status checks per readiness poll
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between status checks, in seconds
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Behaviour when a poll exhausts its attempts
    #[serde(default)]
    pub on_timeout: ReadinessPolicy,

    /// Cluster type selector, matched against the `version` field of `/api/types`
    #[serde(default = "default_type_version")]
    pub type_version: String,

    /// Flavor selector, matched against the `name` field of `/api/flavors`
    #[serde(default = "default_flavor_name")]
    pub flavor_name: String,

    /// Name of the database created inside the cluster
    #[serde(default = "default_database_name")]
    pub database_name: String,

    /// Name given to the dump
    #[serde(default = "default_dump_name")]
    pub dump_name: String,

    /// Number of rows seeded before the dump
    #[serde(default = "default_rows")]
    pub rows: u32,

    /// Schema holding the seeded table
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Seeded table name
    #[serde(default = "default_table")]
    pub table: String,

    /// Database user name; defaults to the operator login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,

    /// Database user password; defaults to the operator password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_password: Option<String>,

    /// Desired cluster topology
    #[serde(default)]
    pub cluster: ClusterSpec,
}

/// Desired cluster topology sent with the create call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSpec {
    #[serde(default = "default_cluster_name")]
    pub name: String,
    #[serde(default = "default_replicas")]
    pub replicas: u32,
    #[serde(default = "default_disk_size")]
    pub disk_size: u64,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_creation_mode")]
    pub creation_mode: String,
    #[serde(default = "default_type_name")]
    pub type_name: String,
    #[serde(default = "default_az")]
    pub az: String,
    #[serde(default = "default_ha_manager")]
    pub ha_manager: String,
    #[serde(default)]
    pub ha: bool,
    #[serde(default)]
    pub options: ClusterOptions,
}

/// Feature flags of the cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterOptions {
    #[serde(default = "default_max_lag")]
    pub maximum_lag_on_failover: u64,
    #[serde(default)]
    pub wal_archive_mode: bool,
    #[serde(default)]
    pub auto_restart: bool,
    #[serde(default)]
    pub production: bool,
    #[serde(default)]
    pub enable_synchronous_mode: bool,
    #[serde(default)]
    pub disable_autofailover: bool,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interval_secs: default_interval_secs(),
            on_timeout: ReadinessPolicy::default(),
            type_version: default_type_version(),
            flavor_name: default_flavor_name(),
            database_name: default_database_name(),
            dump_name: default_dump_name(),
            rows: default_rows(),
            schema: default_schema(),
            table: default_table(),
            user_name: None,
            user_password: None,
            cluster: ClusterSpec::default(),
        }
    }
}

impl Default for ClusterSpec {
    fn default() -> Self {
        Self {
            name: default_cluster_name(),
            replicas: default_replicas(),
            disk_size: default_disk_size(),
            mode: default_mode(),
            creation_mode: default_creation_mode(),
            type_name: default_type_name(),
            az: default_az(),
            ha_manager: default_ha_manager(),
            ha: false,
            options: ClusterOptions::default(),
        }
    }
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            maximum_lag_on_failover: default_max_lag(),
            wal_archive_mode: false,
            auto_restart: false,
            production: false,
            enable_synchronous_mode: false,
            disable_autofailover: false,
        }
    }
}

impl WorkflowSettings {
    /// Delay between status checks
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Fully qualified name of the seeded table
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }

    /// Reject settings the workflow cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidSetting(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.rows == 0 {
            return Err(ConfigError::InvalidSetting(
                "rows must be at least 1".to_string(),
            ));
        }
        for (field, value) in [("schema", &self.schema), ("table", &self.table)] {
            if !is_sql_identifier(value) {
                return Err(ConfigError::InvalidSetting(format!(
                    "{} '{}' is not a plain SQL identifier",
                    field, value
                )));
            }
        }
        if self.database_name.trim().is_empty() {
            return Err(ConfigError::InvalidSetting(
                "database_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Letters, digits and underscores, not starting with a digit
fn is_sql_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// Default value functions for serde
fn default_max_attempts() -> u32 {
    30
}

fn default_interval_secs() -> u64 {
    5
}

fn default_type_version() -> String {
    "15".to_string()
}

fn default_flavor_name() -> String {
    "s1.small".to_string()
}

fn default_database_name() -> String {
    "testDB".to_string()
}

fn default_dump_name() -> String {
    "testDump".to_string()
}

fn default_rows() -> u32 {
    10
}

fn default_schema() -> String {
    "test_schema".to_string()
}

fn default_table() -> String {
    "users".to_string()
}

fn default_cluster_name() -> String {
    "test".to_string()
}

fn default_replicas() -> u32 {
    1
}

fn default_disk_size() -> u64 {
    3_221_225_472
}

fn default_mode() -> String {
    "create".to_string()
}

fn default_creation_mode() -> String {
    "empty".to_string()
}

fn default_type_name() -> String {
    "Postgres Pro Enterprise".to_string()
}

fn default_az() -> String {
    "GZ1".to_string()
}

fn default_ha_manager() -> String {
    "patroni".to_string()
}

fn default_max_lag() -> u64 {
    1_048_576
}
