//! Catalog lookup commands

use dbaasctl_core::CatalogLookup;
use serde_json::json;

use crate::cli::{CatalogCommands, OutputFormat};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output;

pub async fn handle_catalog_command(
    catalog_cmd: &CatalogCommands,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    let session = conn_mgr.authorize(profile_name).await?;
    let catalog = CatalogLookup::new(session.client().clone());

    match catalog_cmd {
        CatalogCommands::Types => {
            let types = catalog.list_types().await?;
            print(&types, output_format)
        }
        CatalogCommands::Flavors => {
            let flavors = catalog.list_flavors().await?;
            print(&flavors, output_format)
        }
        CatalogCommands::Resolve {
            type_version,
            flavor,
        } => {
            let workflow = &conn_mgr.config.workflow;
            let type_version = type_version.as_deref().unwrap_or(&workflow.type_version);
            let flavor = flavor.as_deref().unwrap_or(&workflow.flavor_name);

            let type_id = catalog.resolve_type_id(type_version).await?;
            let flavor_id = catalog.resolve_flavor_id(flavor).await?;
            let resolved = json!({
                "type_version": type_version,
                "type_id": type_id,
                "flavor_name": flavor,
                "flavor_id": flavor_id,
            });
            print(&resolved, output_format)
        }
    }
}

fn print<T: serde::Serialize>(data: &T, output_format: OutputFormat) -> CliResult<()> {
    // Listings read best as a table when no format was asked for
    let format = match output_format {
        OutputFormat::Auto => output::OutputFormat::Table,
        other => other.into(),
    };
    output::print_output(data, format)?;
    Ok(())
}
