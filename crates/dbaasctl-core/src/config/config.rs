//! Configuration management for dbaasctl
//!
//! Handles configuration loading from files, environment variables, and command-line arguments.
//! Configuration is stored in TOML format with support for multiple named profiles.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::credential::CredentialStore;
use super::error::{ConfigError, Result};
use super::workflow::WorkflowSettings;
use crate::session::Credentials;

/// Environment variable holding the control-plane base URL
pub const ENV_API_BASE_URL: &str = "API_BASE_URL";
/// Environment variable holding the operator login
pub const ENV_API_LOGIN: &str = "API_LOGIN";
/// Environment variable holding the operator password
pub const ENV_API_PASSWORD: &str = "API_PASSWORD";

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Profile used when none is given explicitly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    /// Map of profile name -> profile configuration
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
    /// Shape of the provisioning run
    #[serde(default)]
    pub workflow: WorkflowSettings,
}

/// One control-plane endpoint and the operator identity used against it
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Profile {
    /// Base URL of the control-plane API, without the `/api` suffix
    pub api_url: String,
    /// Operator login
    pub login: String,
    /// Operator password; supports the `keyring:` prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Profile {
    /// Check if this profile has a stored password
    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    /// Where the stored password lives, if one is set
    pub fn password_storage(&self) -> Option<&'static str> {
        self.password.as_deref().map(|p| {
            if CredentialStore::is_keyring_reference(p) {
                "keyring"
            } else {
                "plaintext"
            }
        })
    }

    /// Password with keyring references resolved
    pub fn resolve_password(&self) -> Result<Option<String>> {
        let store = CredentialStore::new();
        self.password
            .as_deref()
            .map(|p| {
                store.get_credential(p, None).map_err(|e| {
                    ConfigError::CredentialError(format!("Failed to resolve password: {}", e))
                })
            })
            .transpose()
    }
}

impl Config {
    /// Resolve the profile to use
    ///
    /// Order: explicit name, configured default, first profile alphabetically.
    pub fn resolve_profile(&self, explicit_profile: Option<&str>) -> Result<String> {
        if let Some(profile_name) = explicit_profile {
            return Ok(profile_name.to_string());
        }

        if let Some(ref default) = self.default_profile {
            return Ok(default.clone());
        }

        if let Some((name, _)) = self.list_profiles().first() {
            return Ok((*name).clone());
        }

        Err(ConfigError::NoProfiles {
            suggestion: "Use 'dbaasctl profile set' to create a profile, or set API_BASE_URL, \
                API_LOGIN and API_PASSWORD."
                .to_string(),
        })
    }

    /// Resolve the credentials for a run
    ///
    /// When `use_env` is true, `API_BASE_URL`, `API_LOGIN` and `API_PASSWORD` take
    /// precedence over the profile, and no profile is needed if all three are set.
    /// Values present but empty are passed through; `authorize` rejects them.
    pub fn resolve_credentials(
        &self,
        explicit_profile: Option<&str>,
        use_env: bool,
    ) -> Result<Credentials> {
        let env = |name: &str| {
            if use_env {
                std::env::var(name).ok()
            } else {
                None
            }
        };

        let profile = match self.resolve_profile(explicit_profile) {
            Ok(name) => {
                let profile = self
                    .profiles
                    .get(&name)
                    .ok_or_else(|| ConfigError::ProfileNotFound { name: name.clone() })?;
                debug!("Using profile '{}'", name);
                Some(profile)
            }
            Err(ConfigError::NoProfiles { .. }) if use_env => None,
            Err(e) => return Err(e),
        };

        let base_url = env(ENV_API_BASE_URL)
            .or_else(|| profile.map(|p| p.api_url.clone()))
            .ok_or_else(|| missing("API base URL", ENV_API_BASE_URL))?;
        let login = env(ENV_API_LOGIN)
            .or_else(|| profile.map(|p| p.login.clone()))
            .ok_or_else(|| missing("operator login", ENV_API_LOGIN))?;
        let password = match env(ENV_API_PASSWORD) {
            Some(password) => Some(password),
            None => match profile {
                Some(p) => p.resolve_password()?,
                None => None,
            },
        }
        .ok_or_else(|| missing("operator password", ENV_API_PASSWORD))?;

        Ok(Credentials::new(base_url, login, password))
    }

    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    ///
    /// A missing file yields the default configuration.
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        let expanded_content = Self::expand_env_vars(&content);
        let config: Config = toml::from_str(&expanded_content)?;

        Ok(config)
    }

    /// Save configuration to the standard location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| ConfigError::SaveError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        Ok(())
    }

    /// Set or update a profile
    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Remove a profile by name, clearing the default if it pointed at it
    pub fn remove_profile(&mut self, name: &str) -> Option<Profile> {
        if self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }
        self.profiles.remove(name)
    }

    /// List all profiles sorted by name
    pub fn list_profiles(&self) -> Vec<(&String, &Profile)> {
        let mut profiles: Vec<_> = self.profiles.iter().collect();
        profiles.sort_by_key(|(name, _)| *name);
        profiles
    }

    /// Get the path to the configuration file
    ///
    /// On Linux: ~/.config/dbaasctl/config.toml
    /// On macOS: ~/Library/Application Support/io.dbaasctl.dbaasctl/config.toml
    /// On Windows: %APPDATA%\dbaasctl\dbaasctl\config.toml
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("io", "dbaasctl", "dbaasctl").ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand environment variables in configuration content
    ///
    /// Supports ${VAR} and ${VAR:-default} syntax. Unset variables without a
    /// default are left as-is.
    ///
    /// Example:
    /// ```toml
    /// password = "${DBAAS_PASSWORD}"
    /// api_url = "${DBAAS_URL:-https://dbaas.example.com}"
    /// ```
    fn expand_env_vars(content: &str) -> String {
        let expanded =
            shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok());
        expanded.to_string()
    }
}

fn missing(field: &'static str, env_var: &str) -> ConfigError {
    ConfigError::MissingValue {
        field,
        suggestion: format!(
            "Set {} or configure a profile with 'dbaasctl profile set'.",
            env_var
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReadinessPolicy;

    fn profile(url: &str, login: &str, password: Option<&str>) -> Profile {
        Profile {
            api_url: url.to_string(),
            login: login.to_string(),
            password: password.map(str::to_string),
        }
    }

    fn clear_env() {
        unsafe {
            std::env::remove_var(ENV_API_BASE_URL);
            std::env::remove_var(ENV_API_LOGIN);
            std::env::remove_var(ENV_API_PASSWORD);
        }
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.set_profile(
            "staging".to_string(),
            profile("https://dbaas.example.com", "operator", Some("pw")),
        );
        config.default_profile = Some("staging".to_string());
        config.workflow.on_timeout = ReadinessPolicy::Fail;

        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(config.default_profile, deserialized.default_profile);
        assert_eq!(config.profiles.len(), deserialized.profiles.len());
        assert_eq!(deserialized.workflow.on_timeout, ReadinessPolicy::Fail);
    }

    #[test]
    fn test_password_storage_follows_keyring_prefix() {
        assert_eq!(
            profile("https://a", "op", Some("keyring:staging-password")).password_storage(),
            Some("keyring")
        );
        assert_eq!(
            profile("https://a", "op", Some("pw")).password_storage(),
            Some("plaintext")
        );
        assert_eq!(profile("https://a", "op", None).password_storage(), None);
    }

    #[test]
    fn test_resolve_profile_order() {
        let mut config = Config::default();
        config.set_profile("zeta".to_string(), profile("u", "l", None));
        config.set_profile("alpha".to_string(), profile("u", "l", None));

        assert_eq!(config.resolve_profile(None).unwrap(), "alpha");
        assert_eq!(config.resolve_profile(Some("zeta")).unwrap(), "zeta");

        config.default_profile = Some("zeta".to_string());
        assert_eq!(config.resolve_profile(None).unwrap(), "zeta");
    }

    #[test]
    fn test_no_profiles_errors() {
        let config = Config::default();
        let err = config.resolve_profile(None).unwrap_err();
        assert!(err.to_string().contains("dbaasctl profile set"));
    }

    #[test]
    fn test_remove_profile_clears_default() {
        let mut config = Config::default();
        config.set_profile("main".to_string(), profile("u", "l", None));
        config.default_profile = Some("main".to_string());

        assert!(config.remove_profile("main").is_some());
        assert!(config.default_profile.is_none());
        assert!(config.remove_profile("main").is_none());
    }

    #[test]
    #[serial_test::serial]
    fn test_credentials_from_profile_without_env() {
        clear_env();
        let mut config = Config::default();
        config.set_profile(
            "main".to_string(),
            profile("https://dbaas.example.com", "operator", Some("pw")),
        );

        let creds = config.resolve_credentials(None, false).unwrap();
        assert_eq!(creds.base_url(), "https://dbaas.example.com");
        assert_eq!(creds.login(), "operator");
        assert_eq!(creds.password(), "pw");
    }

    #[test]
    #[serial_test::serial]
    fn test_env_overrides_profile() {
        clear_env();
        unsafe {
            std::env::set_var(ENV_API_LOGIN, "env-operator");
        }
        let mut config = Config::default();
        config.set_profile(
            "main".to_string(),
            profile("https://dbaas.example.com", "operator", Some("pw")),
        );

        let creds = config.resolve_credentials(None, true).unwrap();
        assert_eq!(creds.login(), "env-operator");
        assert_eq!(creds.password(), "pw");

        // Explicit config file: env ignored
        let creds = config.resolve_credentials(None, false).unwrap();
        assert_eq!(creds.login(), "operator");
        clear_env();
    }

    #[test]
    #[serial_test::serial]
    fn test_env_only_credentials() {
        clear_env();
        unsafe {
            std::env::set_var(ENV_API_BASE_URL, "https://env.example.com/");
            std::env::set_var(ENV_API_LOGIN, "env-operator");
            std::env::set_var(ENV_API_PASSWORD, "env-pw");
        }

        let creds = Config::default().resolve_credentials(None, true).unwrap();
        assert_eq!(creds.base_url(), "https://env.example.com");
        assert_eq!(creds.login(), "env-operator");
        clear_env();
    }

    #[test]
    #[serial_test::serial]
    fn test_missing_password_is_reported() {
        clear_env();
        let mut config = Config::default();
        config.set_profile("main".to_string(), profile("u", "operator", None));

        let err = config.resolve_credentials(None, true).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingValue {
                field: "operator password",
                ..
            }
        ));
        assert!(err.to_string().contains("API_PASSWORD"));
    }

    #[test]
    #[serial_test::serial]
    fn test_unknown_explicit_profile() {
        clear_env();
        let config = Config::default();
        let err = config.resolve_credentials(Some("nope"), true).unwrap_err();
        assert!(matches!(err, ConfigError::ProfileNotFound { .. }));
    }

    #[test]
    #[serial_test::serial]
    fn test_env_var_expansion_with_defaults() {
        unsafe {
            std::env::set_var("DBAASCTL_TEST_URL", "https://expanded.example.com");
            std::env::remove_var("DBAASCTL_TEST_MISSING");
        }

        let content = r#"
[profiles.main]
api_url = "${DBAASCTL_TEST_URL}"
login = "${DBAASCTL_TEST_MISSING:-fallback}"
"#;
        let expanded = Config::expand_env_vars(content);
        assert!(expanded.contains("https://expanded.example.com"));
        assert!(expanded.contains("login = \"fallback\""));

        unsafe {
            std::env::remove_var("DBAASCTL_TEST_URL");
        }
    }
}
