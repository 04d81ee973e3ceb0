//! `dbaasctl run`

use colored::Colorize;
use dbaasctl_core::{ProvisioningWorkflow, RunReport};
use tracing::debug;

use super::progress::RunSpinner;
use crate::cli::{OutputFormat, RunArgs};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output;

/// Run the provisioning workflow and print its report
pub async fn handle_run(
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    args: &RunArgs,
    output_format: OutputFormat,
) -> CliResult<()> {
    let credentials = conn_mgr.credentials(profile_name)?;
    let mut settings = conn_mgr.config.workflow.clone();
    args.apply(&mut settings);
    debug!(
        "Running workflow: {} checks every {}s, {} rows, on_timeout={:?}",
        settings.max_attempts, settings.interval_secs, settings.rows, settings.on_timeout
    );

    let spinner = RunSpinner::new(&format!("Provisioning against {}", credentials.base_url()));
    let workflow =
        ProvisioningWorkflow::new(credentials, settings).with_progress(spinner.callback());

    match workflow.run().await {
        Ok(report) => {
            spinner.finish("Workflow completed");
            print_report(&report, output_format)
        }
        Err(e) => {
            spinner.abandon();
            Err(e.into())
        }
    }
}

fn print_report(report: &RunReport, output_format: OutputFormat) -> CliResult<()> {
    match output_format {
        OutputFormat::Auto => {
            println!("{} Workflow completed", "✓".green().bold());
            println!("  Cluster:  {}", report.cluster_id);
            println!("  Database: {}", report.database_id);
            println!("  Dump:     {}", report.dump_id);
            println!(
                "  Rows:     {} inserted, {} restored",
                report.inserted, report.restored
            );
            for deleted in &report.teardown.deleted {
                println!("  Deleted:  {}", deleted);
            }
        }
        other => output::print_output(report, other.into())?,
    }
    Ok(())
}
