//! Release of remotely allocated resources
//!
//! The dump goes first because it belongs to the cluster. Both deletions are
//! always attempted: a failed dump deletion is recorded and the cluster is still
//! deleted.

use serde::Serialize;
use tracing::{error, info};

use crate::error::{CoreError, Result};
use crate::handlers::{ClusterHandler, DumpHandler};
use crate::session::Session;

/// Identifiers of resources a run has created so far
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreatedResources {
    pub cluster_id: Option<String>,
    pub dump_id: Option<String>,
}

impl CreatedResources {
    pub fn is_empty(&self) -> bool {
        self.cluster_id.is_none() && self.dump_id.is_none()
    }
}

/// What teardown deleted and what it could not
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeardownReport {
    /// Deleted resources as `kind id`, in deletion order
    pub deleted: Vec<String>,
    /// One message per failed deletion
    pub failures: Vec<String>,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// `Err(CoreError::Teardown)` if any deletion failed
    pub fn into_result(self) -> Result<Self> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(CoreError::Teardown {
                failures: self.failures,
            })
        }
    }
}

/// Delete the dump, then the cluster
///
/// Without a session there is nothing that could have been created, so this is
/// a no-op. Each deletion requires HTTP 204.
pub async fn teardown(session: Option<&Session>, resources: &CreatedResources) -> TeardownReport {
    let mut report = TeardownReport::default();
    let Some(session) = session else {
        return report;
    };
    if resources.is_empty() {
        return report;
    }

    info!("Tearing down created resources");

    if let Some(dump_id) = &resources.dump_id {
        match DumpHandler::new(session.client().clone())
            .delete(dump_id)
            .await
        {
            Ok(()) => report.deleted.push(format!("dump {}", dump_id)),
            Err(e) => {
                error!("Failed to delete dump {}: {}", dump_id, e);
                report.failures.push(format!("dump {}: {}", dump_id, e));
            }
        }
    }

    if let Some(cluster_id) = &resources.cluster_id {
        match ClusterHandler::new(session.client().clone())
            .delete(cluster_id)
            .await
        {
            Ok(()) => report.deleted.push(format!("cluster {}", cluster_id)),
            Err(e) => {
                error!("Failed to delete cluster {}: {}", cluster_id, e);
                report.failures.push(format!("cluster {}: {}", cluster_id, e));
            }
        }
    }

    report
}
