//! CLI subcommands — monitor loop, one-shot status, config display.

mod config_cmd;
mod monitor;
mod status;

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::Serialize;

pub(super) use crate::RUNNING;
pub(super) use plexhue_lib::bridge::{HueBridge, LightBridge};
pub(super) use plexhue_lib::config::Config;
pub(super) use plexhue_lib::error::Result;
pub(super) use plexhue_lib::light::{self, LightState};
pub(super) use plexhue_lib::server::PlexServer;
use plexhue_lib::PlexhueError;

const PADDING: usize = 2;

/// Compute alignment width for a command's key-value output.
/// Ensures at least PADDING spaces after the longest key in either level,
/// with top-level and indent values aligned to the same column.
pub(super) fn kv_width(top: &[&str], indent: &[&str]) -> usize {
    let top_max = top.iter().map(|k| k.len()).max().unwrap_or(0);
    let indent_max = indent.iter().map(|k| k.len()).max().unwrap_or(0);
    let top_need = if top.is_empty() { 0 } else { top_max + PADDING };
    // Indent keys lose 2 chars of inner width to the "  " prefix
    let indent_need = if indent.is_empty() {
        0
    } else {
        indent_max + PADDING + 2
    };
    top_need.max(indent_need)
}

pub(super) fn format_kv(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("{key:<width$}{value}", width = w)
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{}", format_kv(key, value, w));
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("  {key:<width$}{value}", width = w - 2);
}

// ── Config loading ──

/// Resolve the config path: explicit `--config`, else `./config.json`, else
/// the platform config file.
pub(super) fn config_path(custom: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = custom {
        return Ok(p.to_path_buf());
    }
    let cwd = std::env::current_dir()?;
    Config::resolve_path(&cwd)
        .ok_or_else(|| PlexhueError::Config("no config directory on this platform".into()))
}

/// Load config without validating it.
pub(super) fn load_config(custom: Option<&Path>) -> Result<(Config, PathBuf)> {
    let path = config_path(custom)?;
    let config = Config::load_from(&path)?;
    Ok((config, path))
}

/// Load config and reject it if any field is invalid.
pub(super) fn load_valid_config(custom: Option<&Path>) -> Result<(Config, PathBuf)> {
    let (config, path) = load_config(custom)?;
    if let Err(errors) = config.validate() {
        let joined: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        return Err(PlexhueError::Config(format!(
            "{}: {}",
            path.display(),
            joined.join("; ")
        )));
    }
    Ok((config, path))
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct StatusOutput {
    pub version: String,
    pub config_file: String,
    pub plex: PlexStatusJson,
    pub light: LightStatusJson,
}

#[derive(Serialize)]
pub(super) struct PlexStatusJson {
    pub url: String,
    pub online: bool,
    pub error: Option<String>,
}

#[derive(Serialize)]
pub(super) struct LightStatusJson {
    pub id: String,
    pub state: Option<LightState>,
    pub error: Option<String>,
}

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: String,
    pub settings: Config,
    pub problems: Vec<String>,
    pub saved_to: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Watch Plex and drive the light (default)
    Monitor,

    /// Check Plex and the light once and print the result
    Status,

    /// Show the effective configuration
    Config {
        /// Also write it out (TOML or JSON by extension); defaults to the platform config file
        #[arg(long, value_name = "PATH", num_args = 0..=1)]
        save: Option<Option<PathBuf>>,
    },
}

/// Warn if `--json` was passed to a command that doesn't support it.
fn warn_json_unsupported(cmd_name: &str) {
    log::warn!("--json is not supported for `{cmd_name}` (ignored)");
}

pub fn run(cmd: Command, config_path: Option<&Path>, json: bool) -> Result<()> {
    match cmd {
        Command::Monitor => {
            if json {
                warn_json_unsupported("monitor");
            }
            monitor::cmd_monitor(config_path)
        }
        Command::Status => status::cmd_status(config_path, json),
        Command::Config { save } => config_cmd::cmd_config(config_path, save, json),
    }
}
