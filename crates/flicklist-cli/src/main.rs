use clap::{ArgAction, Parser, Subcommand};
use commands::{auth, clear, config, daemon, invalidate, status, sync};

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "flicklist")]
#[command(about = "FlickList activity sync - keep the local cache in step with your FlickList account")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one activity sync pass
    #[command(long_about = "Compare FlickList's last-activity timestamps with the stored baseline and refresh only the cached data that changed. With --force every cached partition is dropped first and everything is refreshed.")]
    Sync {
        /// Drop all cached data and refresh everything
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
    /// Show account, daily sweep and baseline state
    Status,
    /// Drop one cached partition (e.g. watchlist.movie, lists.my_lists)
    Invalidate {
        /// Partition key in category.subtype form
        key: String,
    },
    /// Clear cached data or stored settings
    #[command(long_about = "Clear cached data. Use --cache to drop every partition and the activity baseline, --expired to purge only expired partitions, --settings to remove the stored settings file, or --all for everything.")]
    Clear {
        /// Clear cache, indexes and settings
        #[arg(long, action = ArgAction::SetTrue)]
        all: bool,

        /// Clear all cached partitions, the baseline and the indexes
        #[arg(long, action = ArgAction::SetTrue)]
        cache: bool,

        /// Purge expired partitions only
        #[arg(long, action = ArgAction::SetTrue)]
        expired: bool,

        /// Remove stored settings (token, user, daily sweep)
        #[arg(long, action = ArgAction::SetTrue)]
        settings: bool,
    },
    /// Manage the FlickList authorization
    Auth {
        #[command(subcommand)]
        cmd: AuthCommands,
    },
    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
    /// Run scheduled sync passes in the foreground
    #[command(long_about = "Run activity sync passes on a cron schedule until interrupted. A regular pass runs on startup unless --no-startup-sync is given.")]
    Daemon {
        /// Cron schedule with seconds (e.g. '0 */30 * * * *')
        #[arg(long, value_name = "SCHEDULE")]
        schedule: Option<String>,

        /// Skip the sync pass on startup
        #[arg(long, action = ArgAction::SetTrue)]
        no_startup_sync: bool,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Store an access token and run a full sync
    SetToken {
        /// Access token (prompted for when omitted)
        #[arg(long)]
        token: Option<String>,
    },
    /// Forget the account and clear everything cached for it
    Revoke {
        /// Do not ask for confirmation
        #[arg(long, action = ArgAction::SetTrue)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let log_file = match &cli.command {
        Commands::Daemon { .. } => Some(flicklist_config::PathManager::default().daemon_log_file()),
        _ => None,
    };
    logging::init_logging_with_file(cli.verbose, cli.quiet, log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Sync { force } => sync::run_sync(force, &output).await,
        Commands::Status => status::run_status(&output).await,
        Commands::Invalidate { key } => invalidate::run_invalidate(&key, &output).await,
        Commands::Clear { all, cache, expired, settings } => {
            clear::run_clear(all, cache, expired, settings, &output).await
        }
        Commands::Auth { cmd } => auth::run_auth(cmd, &output).await,
        Commands::Config { cmd } => config::run_config(cmd.unwrap_or(ConfigCommands::Show), &output).await,
        Commands::Daemon { schedule, no_startup_sync } => {
            daemon::run_daemon(schedule, no_startup_sync, &output).await
        }
    }
}
