use anyhow::Result;
use clap::Parser;
use dbaasctl_core::Config;
use tracing::{debug, error, info, trace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod connection;
mod error;
mod output;

use cli::{Cli, Commands, LogFormat};
use connection::ConnectionManager;
use error::DbaasCtlError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level
    init_tracing(cli.verbose, cli.log_format);

    // Load configuration from specified path or default location
    let (config, config_path) = if let Some(config_file) = &cli.config_file {
        let path = std::path::PathBuf::from(config_file);
        debug!("Loading config from explicit path: {:?}", path);
        let config = Config::load_from_path(&path)?;
        (config, Some(path))
    } else {
        debug!("Loading config from default location");
        (Config::load()?, None)
    };
    let conn_mgr = ConnectionManager::with_config_path(config, config_path);

    if let Err(e) = execute_command(&cli, &conn_mgr).await {
        e.print_diagnostic();
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(verbose: u8, format: LogFormat) {
    // Check for RUST_LOG env var first, then fall back to verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "dbaasctl=warn,dbaasctl_core=warn",
            1 => "dbaasctl=info,dbaasctl_core=info",
            2 => "dbaasctl=debug,dbaasctl_core=debug",
            _ => "dbaasctl=trace,dbaasctl_core=trace,sqlx=debug",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .compact(),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .json(),
            )
            .init(),
    }

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

async fn execute_command(cli: &Cli, conn_mgr: &ConnectionManager) -> Result<(), DbaasCtlError> {
    trace!("Executing command: {:?}", cli.command);
    info!("Command: {}", format_command(&cli.command));

    let start = std::time::Instant::now();
    let result = match &cli.command {
        Commands::Version => {
            debug!("Showing version information");
            match cli.output {
                cli::OutputFormat::Json | cli::OutputFormat::Yaml => {
                    let output_data = serde_json::json!({
                        "version": env!("CARGO_PKG_VERSION"),
                        "name": env!("CARGO_PKG_NAME"),
                    });
                    output::print_output(&output_data, cli.output.into())?;
                }
                _ => {
                    println!("dbaasctl {}", env!("CARGO_PKG_VERSION"));
                }
            }
            Ok(())
        }

        Commands::Run(args) => {
            commands::run::handle_run(conn_mgr, cli.profile.as_deref(), args, cli.output).await
        }

        Commands::Catalog(catalog_cmd) => {
            commands::catalog::handle_catalog_command(
                catalog_cmd,
                conn_mgr,
                cli.profile.as_deref(),
                cli.output,
            )
            .await
        }

        Commands::Cleanup { cluster, dump } => {
            commands::cleanup::handle_cleanup(
                conn_mgr,
                cli.profile.as_deref(),
                cluster,
                dump.as_deref(),
                cli.output,
            )
            .await
        }

        Commands::Profile(profile_cmd) => {
            debug!("Executing profile command");
            commands::profile::handle_profile_command(profile_cmd, conn_mgr, cli.output)
        }
    };

    let duration = start.elapsed();
    match &result {
        Ok(_) => info!("Command completed successfully in {:?}", duration),
        Err(e) => error!("Command failed after {:?}: {}", duration, e),
    }

    result
}

/// Command name for logging; never includes secrets
fn format_command(command: &Commands) -> String {
    match command {
        Commands::Run(_) => "run".to_string(),
        Commands::Catalog(cmd) => match cmd {
            cli::CatalogCommands::Types => "catalog types".to_string(),
            cli::CatalogCommands::Flavors => "catalog flavors".to_string(),
            cli::CatalogCommands::Resolve { .. } => "catalog resolve".to_string(),
        },
        Commands::Cleanup { cluster, dump } => match dump {
            Some(dump) => format!("cleanup cluster={} dump={}", cluster, dump),
            None => format!("cleanup cluster={}", cluster),
        },
        Commands::Profile(cmd) => match cmd {
            cli::ProfileCommands::List => "profile list".to_string(),
            cli::ProfileCommands::Path => "profile path".to_string(),
            cli::ProfileCommands::Show { name } => format!("profile show {}", name),
            cli::ProfileCommands::Set { name, .. } => format!("profile set {}", name),
            cli::ProfileCommands::Remove { name } => format!("profile remove {}", name),
        },
        Commands::Version => "version".to_string(),
    }
}
