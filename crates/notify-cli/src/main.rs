#![forbid(unsafe_code)]

mod cmd;
mod output;
mod watermark;

use clap::{Parser, Subcommand};
use output::OutputMode;
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "notify: replay notification captures through the engine",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Engine config file (defaults to the user config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Pretty
        }
    }

    fn config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(cmd::config::default_config_path)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Replay a captured session",
        long_about = "Feed a bulk fetch result and an optional live stream capture through \
                      the engine, then print the ordered notifications and the unseen count."
    )]
    Replay(cmd::replay::ReplayArgs),

    #[command(
        about = "Show the effective engine config",
        long_about = "Print the engine config after defaults have been applied."
    )]
    Config,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("NOTIFY_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "notify=debug,notify_core=debug,info"
        } else {
            "notify=info,notify_core=info,warn"
        })
    });

    let format = env::var("NOTIFY_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let output = cli.output_mode();
    let config_path = cli.config_path();

    match cli.command {
        Commands::Replay(ref args) => cmd::replay::run_replay(args, config_path.as_deref(), output),
        Commands::Config => cmd::config::run_config(config_path.as_deref(), output),
    }
}
