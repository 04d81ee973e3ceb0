//! CLI structure and command definitions

use clap::{Args, Parser, Subcommand};
use dbaasctl_core::{ReadinessPolicy, WorkflowSettings};

/// Provision, exercise and tear down a DBaaS cluster
#[derive(Parser, Debug)]
#[command(name = "dbaasctl")]
#[command(version, about = "DBaaS provisioning workflow CLI")]
#[command(long_about = "
DBaaS provisioning workflow CLI

Runs a full lifecycle against a Database-as-a-Service control plane: creates a
cluster, a database and a user, seeds a table, takes a dump, truncates, restores
and verifies the data. Every resource the run creates is deleted again.

EXAMPLES:
    # Set up a profile
    dbaasctl profile set staging --api-url https://dbaas.example.com --login operator --password secret

    # Run the workflow with the default profile
    dbaasctl run

    # Or take everything from the environment
    API_BASE_URL=https://dbaas.example.com API_LOGIN=operator API_PASSWORD=secret dbaasctl run

    # Fail instead of proceeding when a resource never becomes ready
    dbaasctl run --require-ready --max-attempts 60

    # See which catalog ids a run would use
    dbaasctl catalog resolve -o json

    # Delete resources left behind by an interrupted run
    dbaasctl cleanup --cluster <cluster-id> --dump <dump-id>
")]
pub struct Cli {
    /// Profile to use for this command
    #[arg(long, short, global = true, env = "DBAASCTL_PROFILE")]
    pub profile: Option<String>,

    /// Path to alternate configuration file
    #[arg(long, global = true, env = "DBAASCTL_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "auto")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Auto,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Table output
    Table,
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full provisioning workflow
    #[command(after_help = "EXAMPLES:
    dbaasctl run
    dbaasctl run --rows 100 --interval 10
    dbaasctl run --require-ready -o json
")]
    Run(RunArgs),

    /// Catalog lookups
    #[command(subcommand)]
    Catalog(CatalogCommands),

    /// Delete a cluster, and optionally a dump, left behind by an earlier run
    Cleanup {
        /// Cluster id
        #[arg(long)]
        cluster: String,

        /// Dump id; deleted before the cluster
        #[arg(long)]
        dump: Option<String>,
    },

    /// Profile management
    #[command(subcommand, visible_alias = "prof")]
    Profile(ProfileCommands),

    /// Show version information
    #[command(visible_alias = "ver")]
    Version,
}

/// Overrides for the `[workflow]` settings of the config file
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Maximum status checks per readiness poll
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Seconds between status checks
    #[arg(long)]
    pub interval: Option<u64>,

    /// Abort when a resource is not ready after the last check
    #[arg(long)]
    pub require_ready: bool,

    /// Number of rows to seed
    #[arg(long)]
    pub rows: Option<u32>,

    /// Cluster type version to look up
    #[arg(long)]
    pub type_version: Option<String>,

    /// Flavor name to look up
    #[arg(long)]
    pub flavor: Option<String>,
}

impl RunArgs {
    /// Apply the flags on top of configured settings
    pub fn apply(&self, settings: &mut WorkflowSettings) {
        if let Some(max_attempts) = self.max_attempts {
            settings.max_attempts = max_attempts;
        }
        if let Some(interval) = self.interval {
            settings.interval_secs = interval;
        }
        if self.require_ready {
            settings.on_timeout = ReadinessPolicy::Fail;
        }
        if let Some(rows) = self.rows {
            settings.rows = rows;
        }
        if let Some(version) = &self.type_version {
            settings.type_version = version.clone();
        }
        if let Some(flavor) = &self.flavor {
            settings.flavor_name = flavor.clone();
        }
    }
}

/// Catalog commands
#[derive(Subcommand, Debug)]
pub enum CatalogCommands {
    /// List cluster types
    Types,
    /// List flavors
    Flavors,
    /// Show the type and flavor ids a run would use
    Resolve {
        /// Cluster type version; defaults to the configured one
        #[arg(long)]
        type_version: Option<String>,

        /// Flavor name; defaults to the configured one
        #[arg(long)]
        flavor: Option<String>,
    },
}

/// Profile management commands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List all configured profiles
    #[command(visible_alias = "ls")]
    List,

    /// Show the path to the configuration file
    Path,

    /// Show details of a specific profile
    #[command(visible_alias = "get")]
    Show {
        /// Profile name to show
        name: String,
    },

    /// Set or create a profile
    #[command(visible_alias = "add")]
    #[command(after_help = "EXAMPLES:
    dbaasctl profile set staging --api-url https://dbaas.example.com --login operator --password secret
    dbaasctl profile set prod --api-url https://dbaas.example.com --login operator --password '${DBAAS_PASSWORD}'
")]
    Set {
        /// Profile name
        name: String,

        /// Control-plane base URL
        #[arg(long)]
        api_url: String,

        /// Operator login
        #[arg(long)]
        login: String,

        /// Operator password
        #[arg(long)]
        password: Option<String>,

        /// Store the password in the OS keyring
        #[cfg(feature = "secure-storage")]
        #[arg(long, requires = "password")]
        use_keyring: bool,

        /// Make this the default profile
        #[arg(long)]
        default: bool,
    },

    /// Remove a profile
    #[command(visible_alias = "rm")]
    Remove {
        /// Profile name to remove
        name: String,
    },
}
