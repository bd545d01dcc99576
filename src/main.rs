mod cli;
mod core;

use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::config::AppConfig;

#[derive(Parser)]
#[command(
    name = "pacebadge",
    about = "Usage pacing badge for subscription AI quotas",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output format (text|json)
    #[arg(short, long, global = true)]
    format: Option<String>,

    /// Shorthand for --format json
    #[arg(short = 'j', long = "json", global = true)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    /// Verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch usage and show the panel with pacing and reset countdowns
    Status {
        /// Use the last stored snapshot instead of fetching
        #[arg(long)]
        cached: bool,
    },
    /// Show the badge as it would look right now
    Badge {
        /// Window to show (short|long, default: both)
        #[arg(short, long)]
        window: Option<String>,

        /// Use the last stored snapshot instead of fetching
        #[arg(long)]
        cached: bool,
    },
    /// Poll usage and keep a rotating badge on screen
    Watch,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Generate default config file
    Init,
    /// Validate config file
    Check,
    /// Print the effective configuration
    Show,
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("pacebadge=debug")
    } else {
        EnvFilter::new("pacebadge=info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = AppConfig::load().unwrap_or_else(|e| {
        warn!("{}; using defaults", e);
        AppConfig::default()
    });

    let output_opts = cli::output::OutputOptions::resolve(
        &config.settings,
        cli.format.as_deref(),
        cli.json,
        cli.pretty,
        cli.no_color,
        cli.verbose,
    );

    match cli.command {
        None => cli::status_cmd::run(false, &config, &output_opts).await?,
        Some(Commands::Status { cached }) => {
            cli::status_cmd::run(cached, &config, &output_opts).await?
        }
        Some(Commands::Badge { window, cached }) => {
            cli::badge_cmd::run(window, cached, &config, &output_opts).await?
        }
        Some(Commands::Watch) => cli::watch_cmd::run(&config, &output_opts).await?,
        Some(Commands::Config { action }) => match action {
            ConfigAction::Init => cli::config_cmd::init(&output_opts)?,
            ConfigAction::Check => cli::config_cmd::check(&output_opts)?,
            ConfigAction::Show => cli::config_cmd::show(&config, &output_opts)?,
        },
    }

    Ok(())
}
