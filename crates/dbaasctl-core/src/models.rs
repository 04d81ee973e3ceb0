//! Wire models for the control-plane API
//!
//! Field names follow the API's snake_case JSON exactly. Response types ignore
//! fields they do not need.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{ClusterOptions, ClusterSpec};

/// Status value the control plane reports for a ready resource
pub const STATUS_READY: &str = "OK";

#[derive(Debug, Clone, Serialize)]
pub struct AuthRequest<'a> {
    pub login: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub refresh_token: String,
}

/// Entry of `/api/types`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterType {
    pub id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub name: String,
}

/// Entry of `/api/flavors`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flavor {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram: Option<u64>,
}

/// Listing endpoints answer with either a bare array or a page object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Items(Vec<T>),
    Page { items: Vec<T> },
}

impl<T> Listing<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Items(items) | Listing::Page { items } => items,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateClusterRequest {
    pub type_id: String,
    pub options: ClusterOptions,
    pub disk_size: u64,
    pub mode: String,
    pub replicas_count: u32,
    pub creation_mode: String,
    pub name: String,
    pub flavor_id: String,
    pub type_name: String,
    pub az: String,
    pub ha_manager: String,
    pub ha: bool,
}

impl CreateClusterRequest {
    /// Build the create payload from the configured topology and resolved catalog ids
    pub fn from_spec(spec: &ClusterSpec, type_id: String, flavor_id: String) -> Self {
        Self {
            type_id,
            options: spec.options.clone(),
            disk_size: spec.disk_size,
            mode: spec.mode.clone(),
            replicas_count: spec.replicas,
            creation_mode: spec.creation_mode.clone(),
            name: spec.name.clone(),
            flavor_id,
            type_name: spec.type_name.clone(),
            az: spec.az.clone(),
            ha_manager: spec.ha_manager.clone(),
            ha: spec.ha,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Instance {
    pub cluster_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateClusterResponse {
    #[serde(default)]
    pub instances: Vec<Instance>,
}

/// Status body shared by clusters, databases and dumps
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: String,
}

impl StatusResponse {
    pub fn is_ready(&self) -> bool {
        self.status == STATUS_READY
    }
}

impl fmt::Display for StatusResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.status)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableSpace {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateDatabaseRequest<'a> {
    pub name: &'a str,
    pub tablespace_id: &'a str,
}

/// Body returned by create calls that hand back a single id
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedResource {
    pub id: String,
}

/// Entry of `GET /api/clusters/{id}/databases`
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub master_connection_string: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateUserRequest<'a> {
    pub databases: Vec<&'a str>,
    pub roles: Vec<&'a str>,
    pub name: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateDumpRequest<'a> {
    pub name: &'a str,
}

/// Restore scope accepted by `dump_restore`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RestoreMode {
    Full,
}

#[derive(Debug, Clone, Serialize)]
pub struct RestoreDumpRequest<'a> {
    pub dump_id: &'a str,
    pub mode: RestoreMode,
    pub restore_users: bool,
}

/// Roles granted to the workflow's database user
pub const USER_ROLES: [&str; 2] = ["pg_write_all_data", "pg_read_all_data"];
