//! Credential storage with optional keyring support
//!
//! Profile passwords can be stored in plaintext, referenced from the OS keyring
//! with a `keyring:` prefix, or overridden by an environment variable.

use super::error::{ConfigError, Result};
use std::env;

/// Prefix that indicates a value should be retrieved from the keyring
const KEYRING_PREFIX: &str = "keyring:";

/// Service name for keyring entries
#[cfg(feature = "secure-storage")]
const SERVICE_NAME: &str = "dbaasctl";

/// Storage backend for credentials
#[derive(Debug, Clone)]
pub enum CredentialStorage {
    /// Store in OS keyring
    #[cfg(feature = "secure-storage")]
    Keyring,
    /// Store as plaintext
    Plaintext,
}

/// Credential store abstraction
pub struct CredentialStore {
    storage: CredentialStorage,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    /// Create a new credential store with automatic backend selection
    pub fn new() -> Self {
        #[cfg(feature = "secure-storage")]
        {
            if Self::is_keyring_available() {
                return Self {
                    storage: CredentialStorage::Keyring,
                };
            }
        }
        Self {
            storage: CredentialStorage::Plaintext,
        }
    }

    #[cfg(feature = "secure-storage")]
    fn is_keyring_available() -> bool {
        match keyring::Entry::new(SERVICE_NAME, "__availability__") {
            Ok(entry) => {
                let _ = entry.get_password();
                true
            }
            Err(_) => false,
        }
    }

    /// Store a credential and return the value to write into the config file
    ///
    /// With the keyring backend this is a `keyring:<key>` reference, otherwise the
    /// value itself.
    pub fn store_credential(&self, key: &str, value: &str) -> Result<String> {
        #[cfg(feature = "secure-storage")]
        {
            if let CredentialStorage::Keyring = self.storage {
                let entry = keyring::Entry::new(SERVICE_NAME, key)
                    .map_err(|e| ConfigError::KeyringError(e.to_string()))?;
                entry.set_password(value).map_err(|e| {
                    ConfigError::KeyringError(format!(
                        "Failed to store credential in keyring: {}",
                        e
                    ))
                })?;
                return Ok(format!("{}{}", KEYRING_PREFIX, key));
            }
        }
        let _ = key;
        Ok(value.to_string())
    }

    /// Retrieve a credential value
    ///
    /// Resolution order:
    /// 1. Environment variable (if `env_var` provided and set)
    /// 2. Keyring, if the value starts with `keyring:`
    /// 3. The value as-is
    pub fn get_credential(&self, value: &str, env_var: Option<&str>) -> Result<String> {
        if let Some(var) = env_var
            && let Ok(env_value) = env::var(var)
        {
            return Ok(env_value);
        }

        match value.strip_prefix(KEYRING_PREFIX) {
            Some(key) => Self::read_keyring(key),
            None => Ok(value.to_string()),
        }
    }

    #[cfg(feature = "secure-storage")]
    fn read_keyring(key: &str) -> Result<String> {
        let entry = keyring::Entry::new(SERVICE_NAME, key)
            .map_err(|e| ConfigError::KeyringError(e.to_string()))?;
        entry.get_password().map_err(|e| {
            ConfigError::KeyringError(format!(
                "Failed to retrieve credential '{}' from keyring: {}",
                key, e
            ))
        })
    }

    #[cfg(not(feature = "secure-storage"))]
    fn read_keyring(key: &str) -> Result<String> {
        Err(ConfigError::CredentialError(format!(
            "Credential '{}' references keyring but secure-storage feature is not enabled",
            key
        )))
    }

    /// Check if a value is a keyring reference
    pub fn is_keyring_reference(value: &str) -> bool {
        value.starts_with(KEYRING_PREFIX)
    }

    /// Get the current storage backend
    pub fn storage_backend(&self) -> &str {
        match self.storage {
            #[cfg(feature = "secure-storage")]
            CredentialStorage::Keyring => "keyring",
            CredentialStorage::Plaintext => "plaintext",
        }
    }
}
