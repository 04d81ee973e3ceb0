//! Error types for dbaasctl
//!
//! Core errors are mapped onto a small set of user-facing categories, each with
//! suggestions for what to try next.

use colored::Colorize;
use dbaasctl_core::{ConfigError, CoreError};
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: step 6 (create database): expected HTTP 201, got 409
///   The run stopped at step 6 (create database).
///
///   tip: check the control plane logs for the request
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<(String, Vec<String>)>,
}

impl CliDiagnostic {
    /// Start a new error diagnostic with the given message.
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    /// Add a detail line below the error message.
    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    /// Add a tip with optional example commands.
    pub fn tip(mut self, description: &str, commands: &[&str]) -> Self {
        self.tips.push((
            description.to_string(),
            commands.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for (description, commands) in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
            for cmd in commands {
                eprintln!("      {}", cmd);
            }
        }
    }
}

/// Main error type for the dbaasctl application
#[derive(Error, Debug)]
pub enum DbaasCtlError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("No profile configured. Use 'dbaasctl profile set' to configure a profile.")]
    NoProfileConfigured,

    #[error("Missing credentials: {message}")]
    MissingCredentials { message: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("{message}")]
    StepFailed {
        step: Option<String>,
        message: String,
    },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Timeout: {message}")]
    Timeout { message: String },

    #[error("Verification failed: {message}")]
    VerificationFailed { message: String },

    #[error("Teardown incomplete: {}", .failures.join("; "))]
    TeardownFailed { failures: Vec<String> },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for dbaasctl operations
pub type Result<T> = std::result::Result<T, DbaasCtlError>;

impl DbaasCtlError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            DbaasCtlError::ProfileNotFound { name } => vec![
                "List available profiles: dbaasctl profile list".to_string(),
                format!(
                    "Create profile '{}': dbaasctl profile set {} --api-url <url> --login <login>",
                    name, name
                ),
            ],
            DbaasCtlError::NoProfileConfigured | DbaasCtlError::MissingCredentials { .. } => vec![
                "Create a profile: dbaasctl profile set <name> --api-url <url> --login <login> --password <password>".to_string(),
                "Or set API_BASE_URL, API_LOGIN and API_PASSWORD".to_string(),
            ],
            DbaasCtlError::AuthenticationFailed { .. } => vec![
                "Check your credentials: dbaasctl profile show <profile>".to_string(),
                "Ensure the API base URL is correct".to_string(),
            ],
            DbaasCtlError::ConnectionError { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify the API base URL is correct: dbaasctl profile show <profile>".to_string(),
            ],
            DbaasCtlError::Timeout { .. } => vec![
                "Allow more checks: dbaasctl run --max-attempts 60".to_string(),
                "Or wait longer between checks: dbaasctl run --interval 10".to_string(),
            ],
            DbaasCtlError::TeardownFailed { .. } => vec![
                "Retry the deletion: dbaasctl cleanup --cluster <cluster-id> --dump <dump-id>"
                    .to_string(),
            ],
            DbaasCtlError::InvalidInput { .. } => vec![
                "Check the command syntax: dbaasctl <command> --help".to_string(),
            ],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&format!("{}", self));

        if let DbaasCtlError::StepFailed {
            step: Some(step), ..
        } = self
        {
            diag = diag.detail(&format!("The run stopped at {}.", step));
        }

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion, &[]);
        }

        diag.print();
    }
}

impl From<CoreError> for DbaasCtlError {
    fn from(err: CoreError) -> Self {
        if err.is_unauthorized() {
            return DbaasCtlError::AuthenticationFailed {
                message: err.to_string(),
            };
        }
        if err.is_timeout() {
            return DbaasCtlError::Timeout {
                message: err.to_string(),
            };
        }
        match err {
            CoreError::Config(config_err) => DbaasCtlError::from(config_err),
            CoreError::MissingCredentials(message) => {
                DbaasCtlError::MissingCredentials { message }
            }
            CoreError::Transport { step, source } => DbaasCtlError::ConnectionError {
                message: format!("{}: {}", step, source),
            },
            CoreError::Verification(message) => DbaasCtlError::VerificationFailed { message },
            CoreError::Teardown { failures } => DbaasCtlError::TeardownFailed { failures },
            other => DbaasCtlError::StepFailed {
                step: other.step().map(|s| s.to_string()),
                message: other.to_string(),
            },
        }
    }
}

impl From<ConfigError> for DbaasCtlError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name } => DbaasCtlError::ProfileNotFound { name },
            ConfigError::NoProfiles { .. } => DbaasCtlError::NoProfileConfigured,
            missing @ ConfigError::MissingValue { .. } => DbaasCtlError::MissingCredentials {
                message: missing.to_string(),
            },
            ConfigError::InvalidSetting(message) => DbaasCtlError::InvalidInput { message },
            other => DbaasCtlError::Configuration(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for DbaasCtlError {
    fn from(err: serde_json::Error) -> Self {
        DbaasCtlError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<anyhow::Error> for DbaasCtlError {
    fn from(err: anyhow::Error) -> Self {
        DbaasCtlError::Configuration(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbaasctl_core::{ResourceKind, Step};

    #[test]
    fn test_unauthorized_maps_to_authentication_failed() {
        let err: DbaasCtlError = CoreError::UnexpectedStatus {
            step: Step::Authenticate,
            expected: "200".to_string(),
            actual: 401,
            body: String::new(),
        }
        .into();
        assert!(matches!(err, DbaasCtlError::AuthenticationFailed { .. }));
        assert!(!err.suggestions().is_empty());
    }

    #[test]
    fn test_not_ready_maps_to_timeout() {
        let err: DbaasCtlError = CoreError::NotReady {
            step: Step::AwaitCluster,
            resource: ResourceKind::Cluster,
            id: "c-1".to_string(),
            attempts: 30,
            last_status: "CREATING".to_string(),
        }
        .into();
        assert!(matches!(err, DbaasCtlError::Timeout { .. }));
        assert!(err.suggestions()[0].contains("--max-attempts"));
    }

    #[test]
    fn test_step_failure_keeps_step() {
        let err: DbaasCtlError = CoreError::UnexpectedStatus {
            step: Step::CreateDatabase,
            expected: "201".to_string(),
            actual: 409,
            body: String::new(),
        }
        .into();
        match err {
            DbaasCtlError::StepFailed { step, message } => {
                assert_eq!(step.as_deref(), Some("step 6 (create database)"));
                assert!(message.contains("409"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_config_errors_map_to_profile_categories() {
        let err: DbaasCtlError = ConfigError::ProfileNotFound {
            name: "prod".to_string(),
        }
        .into();
        assert!(matches!(err, DbaasCtlError::ProfileNotFound { .. }));

        let err: DbaasCtlError = CoreError::Config(ConfigError::NoProfiles {
            suggestion: String::new(),
        })
        .into();
        assert!(matches!(err, DbaasCtlError::NoProfileConfigured));
    }

    #[test]
    fn test_failed_save_is_a_configuration_error() {
        let err: DbaasCtlError = anyhow::anyhow!("permission denied")
            .context("Failed to save configuration")
            .into();
        assert!(matches!(err, DbaasCtlError::Configuration(_)));
        let msg = err.to_string();
        assert!(msg.starts_with("Configuration error: Failed to save configuration"));
        assert!(msg.contains("permission denied"));
    }

    #[test]
    fn test_teardown_failure_suggests_cleanup() {
        let err: DbaasCtlError = CoreError::Teardown {
            failures: vec!["cluster c-1: boom".to_string()],
        }
        .into();
        assert!(err.to_string().contains("cluster c-1: boom"));
        assert!(err.suggestions()[0].contains("dbaasctl cleanup"));
    }
}
