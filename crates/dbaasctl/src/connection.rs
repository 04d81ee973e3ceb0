//! Credential resolution and session setup for the DBaaS control plane

use crate::error::Result as CliResult;
use anyhow::Context;
use dbaasctl_core::{Config, Credentials, DbaasClient, Session, authorize};
use tracing::{debug, info};

/// Resolves credentials from profiles and environment, and opens sessions
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<std::path::PathBuf>,
}

impl ConnectionManager {
    /// Create a new connection manager with a custom config path
    pub fn with_config_path(config: Config, config_path: Option<std::path::PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Save the configuration to the appropriate location
    pub fn save_config(&self) -> CliResult<()> {
        if let Some(ref path) = self.config_path {
            self.config
                .save_to_path(path)
                .context("Failed to save configuration")?;
        } else {
            self.config.save().context("Failed to save configuration")?;
        }
        Ok(())
    }

    /// Resolve credentials for a profile with environment variable override support
    ///
    /// When --config-file is explicitly specified, environment variables are ignored to
    /// keep the configuration isolated.
    pub fn credentials(&self, profile_name: Option<&str>) -> CliResult<Credentials> {
        let use_env_vars = self.config_path.is_none();
        debug!(
            "Config path: {:?}, use_env_vars: {}",
            self.config_path, use_env_vars
        );
        if !use_env_vars {
            info!("--config-file specified explicitly, ignoring environment variables");
        }

        Ok(self
            .config
            .resolve_credentials(profile_name, use_env_vars)?)
    }

    /// Authorize against the control plane and return a session
    pub async fn authorize(&self, profile_name: Option<&str>) -> CliResult<Session> {
        let credentials = self.credentials(profile_name)?;
        let client = DbaasClient::new(credentials.base_url());
        Ok(authorize(&client, &credentials).await?)
    }
}
