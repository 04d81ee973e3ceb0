//! Profile management command implementations

use crate::cli::{OutputFormat, ProfileCommands};
use crate::connection::ConnectionManager;
use crate::error::{DbaasCtlError, Result as CliResult};
use crate::output;
use dbaasctl_core::{Config, Profile};
use serde_json::json;
use tracing::{debug, trace};
#[cfg(feature = "secure-storage")]
use tracing::warn;

/// Handle profile management commands
pub fn handle_profile_command(
    profile_cmd: &ProfileCommands,
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
) -> CliResult<()> {
    use ProfileCommands::*;

    match profile_cmd {
        List => handle_list(conn_mgr, output_format),
        Path => handle_path(conn_mgr, output_format),
        Show { name } => handle_show(conn_mgr, name, output_format),
        Set {
            name,
            api_url,
            login,
            password,
            #[cfg(feature = "secure-storage")]
            use_keyring,
            default,
        } => {
            let stored_password = match password {
                #[cfg(feature = "secure-storage")]
                Some(password) if *use_keyring => Some(store_in_keyring(name, password)?),
                other => other.clone(),
            };
            handle_set(
                conn_mgr,
                name,
                Profile {
                    api_url: api_url.clone(),
                    login: login.clone(),
                    password: stored_password,
                },
                *default,
            )
        }
        Remove { name } => handle_remove(conn_mgr, name),
    }
}

fn config_path_display(conn_mgr: &ConnectionManager) -> Option<String> {
    conn_mgr
        .config_path
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .or_else(|| {
            Config::config_path()
                .ok()
                .map(|p| p.to_string_lossy().to_string())
        })
}

fn is_default(conn_mgr: &ConnectionManager, name: &str) -> bool {
    conn_mgr.config.default_profile.as_deref() == Some(name)
}

fn handle_list(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    debug!("Listing all configured profiles");
    let profiles = conn_mgr.config.list_profiles();
    trace!("Found {} profiles", profiles.len());

    match output_format {
        OutputFormat::Auto => {
            if profiles.is_empty() {
                println!("No profiles configured.");
                println!("Use 'dbaasctl profile set' to create a profile.");
                return Ok(());
            }
            for (name, profile) in profiles {
                let marker = if is_default(conn_mgr, name) { "*" } else { " " };
                println!("{} {:<16} {} ({})", marker, name, profile.api_url, profile.login);
            }
        }
        other => {
            let list: Vec<serde_json::Value> = profiles
                .iter()
                .map(|(name, profile)| {
                    json!({
                        "name": name,
                        "api_url": profile.api_url,
                        "login": profile.login,
                        "is_default": is_default(conn_mgr, name),
                    })
                })
                .collect();
            let data = json!({
                "config_path": config_path_display(conn_mgr),
                "profiles": list,
            });
            output::print_output(&data, other.into())?;
        }
    }
    Ok(())
}

fn handle_path(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    let config_path = match &conn_mgr.config_path {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };

    match output_format {
        OutputFormat::Json | OutputFormat::Yaml => {
            let output_data = json!({ "config_path": config_path.to_string_lossy() });
            output::print_output(&output_data, output_format.into())?;
        }
        _ => println!("{}", config_path.display()),
    }
    Ok(())
}

fn handle_show(
    conn_mgr: &ConnectionManager,
    name: &str,
    output_format: OutputFormat,
) -> CliResult<()> {
    let profile = conn_mgr
        .config
        .profiles
        .get(name)
        .ok_or_else(|| DbaasCtlError::ProfileNotFound {
            name: name.to_string(),
        })?;

    match output_format {
        OutputFormat::Auto => {
            println!("Profile: {}", name);
            println!("API URL: {}", profile.api_url);
            println!("Login: {}", profile.login);
            match profile.password_storage() {
                Some(storage) => println!("Password: configured ({})", storage),
                None => println!("Password: not set (API_PASSWORD required)"),
            }
            if is_default(conn_mgr, name) {
                println!("Default: yes");
            }
        }
        other => {
            let data = json!({
                "name": name,
                "api_url": profile.api_url,
                "login": profile.login,
                "password_configured": profile.has_password(),
                "password_storage": profile.password_storage(),
                "is_default": is_default(conn_mgr, name),
            });
            output::print_output(&data, other.into())?;
        }
    }
    Ok(())
}

#[cfg(feature = "secure-storage")]
fn store_in_keyring(name: &str, password: &str) -> CliResult<String> {
    use dbaasctl_core::config::CredentialStore;

    let store = CredentialStore::new();
    if store.storage_backend() != "keyring" {
        warn!("OS keyring unavailable, storing password for '{}' in plaintext", name);
    }
    Ok(store.store_credential(&format!("{}-password", name), password)?)
}

fn handle_set(
    conn_mgr: &ConnectionManager,
    name: &str,
    profile: Profile,
    make_default: bool,
) -> CliResult<()> {
    debug!("Setting profile: {}", name);
    let existed = conn_mgr.config.profiles.contains_key(name);

    let mut config = conn_mgr.config.clone();
    config.set_profile(name.to_string(), profile);
    // The first profile becomes the default
    if make_default || config.default_profile.is_none() {
        config.default_profile = Some(name.to_string());
    }

    let updated = ConnectionManager::with_config_path(config, conn_mgr.config_path.clone());
    updated.save_config()?;

    let verb = if existed { "updated" } else { "saved" };
    match config_path_display(conn_mgr) {
        Some(path) => {
            println!("Profile '{}' {} to:", name, verb);
            println!("  {}", path);
        }
        None => println!("Profile '{}' {}.", name, verb),
    }
    Ok(())
}

fn handle_remove(conn_mgr: &ConnectionManager, name: &str) -> CliResult<()> {
    debug!("Removing profile: {}", name);

    if !conn_mgr.config.profiles.contains_key(name) {
        return Err(DbaasCtlError::ProfileNotFound {
            name: name.to_string(),
        });
    }

    let was_default = is_default(conn_mgr, name);
    let mut config = conn_mgr.config.clone();
    config.remove_profile(name);

    let updated = ConnectionManager::with_config_path(config, conn_mgr.config_path.clone());
    updated.save_config()?;

    println!("Profile '{}' removed successfully.", name);
    if was_default {
        println!("Default profile cleared.");
    }
    Ok(())
}
