//! `dbaasctl cleanup`: teardown for resources an interrupted run left behind

use colored::Colorize;
use dbaasctl_core::{CreatedResources, teardown};
use tracing::info;

use crate::cli::OutputFormat;
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output;

pub async fn handle_cleanup(
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    cluster_id: &str,
    dump_id: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    let session = conn_mgr.authorize(profile_name).await?;
    let resources = CreatedResources {
        cluster_id: Some(cluster_id.to_string()),
        dump_id: dump_id.map(str::to_string),
    };
    info!("Cleaning up {:?}", resources);

    let report = teardown(Some(&session), &resources).await.into_result()?;

    match output_format {
        OutputFormat::Auto => {
            for deleted in &report.deleted {
                println!("{} Deleted {}", "✓".green().bold(), deleted);
            }
        }
        other => output::print_output(&report, other.into())?,
    }
    Ok(())
}
