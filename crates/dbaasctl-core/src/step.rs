//! Named steps of the provisioning workflow
//!
//! Errors and log lines carry the step they belong to so a failed run says
//! exactly where it stopped.

use serde::Serialize;
use std::fmt;

/// One step of the provisioning lifecycle, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    Authenticate,
    ResolveCatalog,
    CreateCluster,
    AwaitCluster,
    SelectTablespace,
    CreateDatabase,
    AwaitDatabase,
    CreateUser,
    FetchConnection,
    Populate,
    CreateDump,
    AwaitDump,
    Truncate,
    Restore,
    Verify,
    DeleteDump,
    DeleteCluster,
}

impl Step {
    /// Position in the lifecycle; teardown steps come after the fifteen run steps
    pub fn ordinal(self) -> u8 {
        match self {
            Step::Authenticate => 1,
            Step::ResolveCatalog => 2,
            Step::CreateCluster => 3,
            Step::AwaitCluster => 4,
            Step::SelectTablespace => 5,
            Step::CreateDatabase => 6,
            Step::AwaitDatabase => 7,
            Step::CreateUser => 8,
            Step::FetchConnection => 9,
            Step::Populate => 10,
            Step::CreateDump => 11,
            Step::AwaitDump => 12,
            Step::Truncate => 13,
            Step::Restore => 14,
            Step::Verify => 15,
            Step::DeleteDump => 16,
            Step::DeleteCluster => 17,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Step::Authenticate => "authenticate",
            Step::ResolveCatalog => "resolve catalog ids",
            Step::CreateCluster => "create cluster",
            Step::AwaitCluster => "await cluster ready",
            Step::SelectTablespace => "select tablespace",
            Step::CreateDatabase => "create database",
            Step::AwaitDatabase => "await database ready",
            Step::CreateUser => "create database user",
            Step::FetchConnection => "fetch connection string",
            Step::Populate => "populate table",
            Step::CreateDump => "create dump",
            Step::AwaitDump => "await dump ready",
            Step::Truncate => "truncate table",
            Step::Restore => "restore from dump",
            Step::Verify => "verify restored rows",
            Step::DeleteDump => "delete dump",
            Step::DeleteCluster => "delete cluster",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({})", self.ordinal(), self.name())
    }
}
