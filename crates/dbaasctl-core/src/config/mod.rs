//! Configuration and profile management for dbaasctl
//!
// Allow nested config module - this is intentional for the config subsystem

#![allow(clippy::module_inception)]
//!
//! This module provides the configuration system for the provisioning workflow:
//! where the control plane lives, which operator identity to use, and how the
//! workflow should shape and wait for the resources it creates.
//!
//! # Features
//!
//! - Multiple named profiles for different control-plane endpoints
//! - Secure credential storage using OS keyring (optional)
//! - Environment variable expansion in config files
//! - `API_BASE_URL` / `API_LOGIN` / `API_PASSWORD` overrides
//! - Platform-specific config file locations

pub mod config;
pub mod credential;
pub mod error;
pub mod workflow;

// Re-export main types for convenience
pub use config::{Config, Profile};
pub use credential::{CredentialStorage, CredentialStore};
pub use error::{ConfigError, Result};
pub use workflow::{ClusterOptions, ClusterSpec, ReadinessPolicy, WorkflowSettings};
