//! # dbaasctl-core
//!
//! Shared engine for driving a Database-as-a-Service control plane through a full
//! resource lifecycle: authenticate, create a cluster, a database and a user, seed
//! data, take a dump, restore it and verify the result. Every remote resource the
//! run creates is deleted again, whatever the outcome.
//!
//! ## Layers
//!
//! - **Config** - profiles, credentials and workflow settings ([`config`])
//! - **Transport** - a thin `reqwest` wrapper with typed decoding ([`client`], [`models`])
//! - **Calls** - one handler per remote resource ([`handlers`]) and catalog lookups ([`catalog`])
//! - **Polling** - a single bounded "poll until ready" primitive ([`progress`])
//! - **Workflow** - the ordered lifecycle plus guaranteed teardown ([`workflow`], [`teardown`])
//! - **Data plane** - the SQL side of the run ([`dataplane`], [`connection`])
//!
//! ```text
//! workflow ──► catalog ──► client
//!    │  └────► handlers ─► client
//!    ├───────► dataplane
//!    └───────► teardown ─► handlers
//! ```

pub mod catalog;
pub mod client;
pub mod config;
pub mod connection;
pub mod dataplane;
pub mod error;
pub mod handlers;
pub mod models;
pub mod progress;
pub mod session;
pub mod step;
pub mod teardown;
pub mod workflow;

pub use catalog::CatalogLookup;
pub use client::{ApiResponse, DbaasClient};
pub use config::{
    ClusterSpec, Config, ConfigError, Profile, ReadinessPolicy, WorkflowSettings,
};
pub use connection::ConnectionDescriptor;
pub use dataplane::{DataPlane, DataPlaneConnector, PgConnector, PgDataPlane, SeedRow, UserRow};
pub use error::{CoreError, Result};
pub use progress::{
    PollOutcome, PollPolicy, ProgressCallback, ProgressEvent, ResourceKind, poll_until,
};
pub use session::{Credentials, Session, authorize};
pub use step::Step;
pub use teardown::{CreatedResources, TeardownReport, teardown};
pub use workflow::{ProvisioningWorkflow, RunReport};
