//! plexhue — turn a Philips Hue light red while Plex Media Server is offline.
//!
//! Runs in the foreground until Ctrl+C; a bare invocation starts the monitor.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

mod cli;

/// Shared shutdown flag — set by Ctrl+C handler.
pub static RUNNING: AtomicBool = AtomicBool::new(true);

#[derive(Parser)]
#[command(
    name = "plexhue",
    version,
    about = "Turn a Hue light red while Plex Media Server is offline"
)]
struct Args {
    /// Config file (JSON, or TOML with a .toml extension)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Output as JSON (for status, config)
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<cli::Command>,
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_secs()
        .format_target(false)
        .init();

    ctrlc::set_handler(move || {
        RUNNING.store(false, Ordering::SeqCst);
    })
    .ok();

    let command = args.command.unwrap_or(cli::Command::Monitor);
    if let Err(e) = cli::run(command, args.config.as_deref(), args.json) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
