//! Unified error handling for dbaasctl-core
//!
//! Every failure class of a run maps to one variant. Step-scoped variants carry
//! the [`Step`] they came from so callers can print where a run stopped and what
//! was expected.
//!
//! # Example
//!
//! ```rust
//! use dbaasctl_core::{CoreError, Step};
//!
//! let err = CoreError::UnexpectedStatus {
//!     step: Step::CreateCluster,
//!     expected: "201".to_string(),
//!     actual: 401,
//!     body: String::new(),
//! };
//! assert!(err.is_unauthorized());
//! assert_eq!(err.step(), Some(Step::CreateCluster));
//! ```

use crate::config::ConfigError;
use crate::progress::ResourceKind;
use crate::step::Step;
use thiserror::Error;

/// Longest response body excerpt kept in an error message
const BODY_EXCERPT_LEN: usize = 512;

/// Boxed source for data-plane failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Core error type for the provisioning workflow
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration could not be loaded or resolved
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Login or password missing; raised before any remote call
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// Request could not be built or sent
    #[error("{step}: request failed: {source}")]
    Transport {
        step: Step,
        #[source]
        source: reqwest::Error,
    },

    /// Control plane answered with a status the step does not accept
    #[error("{step}: expected HTTP {expected}, got {actual}{}", body_suffix(.body))]
    UnexpectedStatus {
        step: Step,
        expected: String,
        actual: u16,
        body: String,
    },

    /// Response body did not match the expected shape
    #[error("{step}: malformed response body: {source}")]
    Decode {
        step: Step,
        #[source]
        source: serde_json::Error,
    },

    /// Authorization succeeded but returned no token
    #[error("step 1 (authenticate): refresh_token is empty in the authorization response")]
    EmptyToken,

    /// No catalog entry matched the configured selector
    #[error("step 2 (resolve catalog ids): no {kind} matches '{target}'")]
    CatalogMiss { kind: &'static str, target: String },

    /// A listing the step needs an entry from came back empty
    #[error("{step}: response contained no {what}")]
    EmptyListing { step: Step, what: &'static str },

    /// Polling budget exhausted under the `fail` readiness policy
    #[error(
        "{step}: {resource} {id} not ready after {attempts} checks (last status: '{last_status}')"
    )]
    NotReady {
        step: Step,
        resource: ResourceKind,
        id: String,
        attempts: u32,
        last_status: String,
    },

    /// SQL failure against the provisioned database
    #[error("{step}: database error: {source}")]
    DataPlane {
        step: Step,
        #[source]
        source: BoxError,
    },

    /// Restored data does not match what was inserted
    #[error("step 15 (verify restored rows): {0}")]
    Verification(String),

    /// One or more teardown deletions failed
    #[error("Teardown failed: {}", .failures.join("; "))]
    Teardown { failures: Vec<String> },
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

fn body_suffix(body: &str) -> String {
    if body.trim().is_empty() {
        String::new()
    } else {
        format!(": {}", body.trim())
    }
}

/// Trim a response body for inclusion in an error
pub(crate) fn excerpt(body: &str) -> String {
    if body.chars().count() <= BODY_EXCERPT_LEN {
        return body.to_string();
    }
    let mut cut: String = body.chars().take(BODY_EXCERPT_LEN).collect();
    cut.push_str("...");
    cut
}

impl CoreError {
    /// Wrap any data-plane error for the given step
    pub fn data_plane(step: Step, source: impl Into<BoxError>) -> Self {
        CoreError::DataPlane {
            step,
            source: source.into(),
        }
    }

    /// The workflow step this error was raised in, if it is step-scoped
    #[must_use]
    pub fn step(&self) -> Option<Step> {
        match self {
            CoreError::Transport { step, .. }
            | CoreError::UnexpectedStatus { step, .. }
            | CoreError::Decode { step, .. }
            | CoreError::EmptyListing { step, .. }
            | CoreError::NotReady { step, .. }
            | CoreError::DataPlane { step, .. } => Some(*step),
            CoreError::EmptyToken | CoreError::MissingCredentials(_) => Some(Step::Authenticate),
            CoreError::CatalogMiss { .. } => Some(Step::ResolveCatalog),
            CoreError::Verification(_) => Some(Step::Verify),
            CoreError::Config(_) | CoreError::Teardown { .. } => None,
        }
    }

    /// HTTP status returned by the control plane, if any
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            CoreError::UnexpectedStatus { actual, .. } => Some(*actual),
            CoreError::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true if this is an authentication/authorization error (401/403)
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403)) || matches!(self, CoreError::EmptyToken)
    }

    /// Returns true if this is a "not found" error (404)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns true if this is a timeout, either on the wire or while polling
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            CoreError::Transport { source, .. } => source.is_timeout(),
            CoreError::NotReady { .. } => true,
            _ => false,
        }
    }

    /// Returns true if this error was raised before any remote call
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CoreError::Config(_) | CoreError::MissingCredentials(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_status_display() {
        let err = CoreError::UnexpectedStatus {
            step: Step::CreateDatabase,
            expected: "201".to_string(),
            actual: 409,
            body: "{\"error\":\"exists\"}".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("step 6 (create database)"));
        assert!(msg.contains("expected HTTP 201, got 409"));
        assert!(msg.ends_with("{\"error\":\"exists\"}"));
    }

    #[test]
    fn test_unexpected_status_empty_body_has_no_suffix() {
        let err = CoreError::UnexpectedStatus {
            step: Step::DeleteCluster,
            expected: "204".to_string(),
            actual: 500,
            body: "  ".to_string(),
        };
        assert!(err.to_string().ends_with("got 500"));
    }

    #[test]
    fn test_status_helpers() {
        let err = CoreError::UnexpectedStatus {
            step: Step::Authenticate,
            expected: "200".to_string(),
            actual: 403,
            body: String::new(),
        };
        assert!(err.is_unauthorized());
        assert!(!err.is_not_found());
        assert_eq!(err.status(), Some(403));

        let err = CoreError::UnexpectedStatus {
            step: Step::AwaitDump,
            expected: "200".to_string(),
            actual: 404,
            body: String::new(),
        };
        assert!(err.is_not_found());
    }

    #[test]
    fn test_empty_token_is_unauthorized_in_authenticate_step() {
        let err = CoreError::EmptyToken;
        assert!(err.is_unauthorized());
        assert_eq!(err.step(), Some(Step::Authenticate));
    }

    #[test]
    fn test_not_ready_names_its_step() {
        let err = CoreError::NotReady {
            step: Step::Restore,
            resource: ResourceKind::Dump,
            id: "d-1".to_string(),
            attempts: 30,
            last_status: "IN_PROGRESS".to_string(),
        };
        assert!(err.is_timeout());
        assert_eq!(err.step(), Some(Step::Restore));
        let msg = err.to_string();
        assert!(msg.starts_with("step 14 (restore from dump): dump d-1"), "{msg}");
        assert!(msg.contains("not ready after 30 checks"));
    }

    #[test]
    fn test_teardown_joins_failures() {
        let err = CoreError::Teardown {
            failures: vec!["dump d-1: 500".to_string(), "cluster c-1: 500".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Teardown failed: dump d-1: 500; cluster c-1: 500"
        );
        assert_eq!(err.step(), None);
    }

    #[test]
    fn test_configuration_errors_are_flagged() {
        assert!(CoreError::MissingCredentials("API_LOGIN".to_string()).is_configuration());
        assert!(!CoreError::Verification("x".to_string()).is_configuration());
    }

    #[test]
    fn test_excerpt_truncates_long_bodies() {
        let long = "x".repeat(2000);
        let cut = excerpt(&long);
        assert!(cut.len() < 600);
        assert!(cut.ends_with("..."));
        assert_eq!(excerpt("short"), "short");
    }
}
