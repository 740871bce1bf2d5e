//! netmigctl - checks and mutations for a cluster network-provider migration
//!
//! Every subcommand prints one JSON report on stdout. Logs go to stderr.
//! Exit codes: 0 success, 1 check failed, 2 fatal error.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use netmig_common::{
    Config, NetworkProvider, PollConfig, PollError, ProbeExecutor, RealProbeExecutor, StepReport,
};
use netmigctl::commands::{self, PatchPlan};
use netmigctl::oc::Oc;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;

// Version is embedded at build time
const VERSION: &str = env!("NETMIG_VERSION");

#[derive(Parser)]
#[command(name = "netmigctl")]
#[command(about = "Network provider migration checks", long_about = None)]
#[command(version = VERSION)]
struct Cli {
    /// Config file (defaults to /etc/netmig/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the oc binary
    #[arg(long, global = true)]
    oc: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Time budget overrides
#[derive(Args, Debug, Clone, Copy, Default)]
struct PollArgs {
    /// Overall timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Delay between attempts in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    delay: Option<u64>,
}

impl PollArgs {
    fn apply(&self, base: PollConfig) -> PollConfig {
        base.with_overrides(self.timeout, self.delay, None)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Verify the declared migration network type
    CheckMigration {
        /// Expected value of status.migration.networkType
        #[arg(long)]
        expected_network_type: String,

        /// Maximum number of attempts
        #[arg(long)]
        max_retries: Option<u32>,

        #[command(flatten)]
        poll: PollArgs,
    },

    /// Wait until the cluster reports the expected network type
    CheckProvider {
        /// Expected value of status.networkType
        #[arg(long)]
        expected_network_type: String,

        #[command(flatten)]
        poll: PollArgs,
    },

    /// Null out a provider config in the network operator and delete a namespace
    PatchNetwork {
        /// Key under spec.defaultNetwork to remove (e.g. openshiftSDNConfig)
        #[arg(long)]
        network_provider_config: String,

        /// Namespace to delete after patching
        #[arg(long)]
        namespace: Option<String>,

        /// Show what would be done
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        poll: PollArgs,
    },

    /// Verify every node runs the rendered config for the provider
    VerifyMachineConfig {
        /// OVNKubernetes or OpenShiftSDN
        #[arg(long)]
        network_type: NetworkProvider,

        #[command(flatten)]
        poll: PollArgs,

        /// Timeout in seconds of the per-node ExecStart check
        #[arg(long)]
        marker_timeout: Option<u64>,

        /// Delay in seconds of the per-node ExecStart check
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        marker_delay: Option<u64>,
    },

    /// Wait for all machine config pools to settle
    WaitMco {
        #[command(flatten)]
        poll: PollArgs,
    },

    /// Wait for the network cluster operator to report PROGRESSING=True
    WaitNetworkCo {
        #[command(flatten)]
        poll: PollArgs,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            2
        }
    };
    std::process::exit(code);
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load(),
    };
    let oc = Oc::new(cli.oc.clone().unwrap_or_else(|| config.oc_path.clone()));
    let executor = RealProbeExecutor::new();

    let (report, code) = match dispatch(&executor, &oc, &config, cli.command).await {
        Ok(report) => {
            let code = report.exit_code();
            (report, code)
        }
        Err(e) => {
            error!("{}", e);
            (StepReport::failure(e.to_string()), e.exit_code())
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(code)
}

async fn dispatch<E: ProbeExecutor + ?Sized>(
    executor: &E,
    oc: &Oc,
    config: &Config,
    command: Commands,
) -> Result<StepReport, PollError> {
    match command {
        Commands::CheckMigration {
            expected_network_type,
            max_retries,
            poll,
        } => {
            let settings = config
                .migration
                .with_overrides(poll.timeout, poll.delay, max_retries)
                .to_settings();
            commands::check_migration(executor, oc, settings, &expected_network_type).await
        }
        Commands::CheckProvider {
            expected_network_type,
            poll,
        } => {
            let settings = poll.apply(config.provider).to_settings();
            commands::check_provider(executor, oc, settings, &expected_network_type).await
        }
        Commands::PatchNetwork {
            network_provider_config,
            namespace,
            dry_run,
            poll,
        } => {
            let plan = PatchPlan {
                provider_config: network_provider_config,
                namespace,
                dry_run,
            };
            let settings = poll.apply(config.network_config).to_settings();
            commands::patch_network(executor, oc, settings, &plan).await
        }
        Commands::VerifyMachineConfig {
            network_type,
            poll,
            marker_timeout,
            marker_delay,
        } => {
            let rollout = poll.apply(config.machine_config).to_settings();
            let marker = config
                .machine_config_marker
                .with_overrides(marker_timeout, marker_delay, None)
                .to_settings();
            commands::verify_machine_config(executor, oc, rollout, marker, network_type).await
        }
        Commands::WaitMco { poll } => {
            let settings = poll.apply(config.mco).to_settings();
            commands::wait_for_mco(executor, oc, settings).await
        }
        Commands::WaitNetworkCo { poll } => {
            let settings = poll.apply(config.network_co).to_settings();
            commands::wait_for_network_co(executor, oc, settings).await
        }
    }
}
