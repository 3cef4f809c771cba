//! `config` subcommand — show the effective configuration and any problems.
//!
//! With `--save` the loaded settings are also written out, which converts a
//! legacy `config.json` into the platform TOML file.

use std::path::{Path, PathBuf};

use super::{Config, ConfigOutput, PlexhueError, Result, kv, kv_indent, kv_width};

/// Where `--save` writes: the given path, or the platform config file.
fn save_target(save: Option<PathBuf>) -> Result<PathBuf> {
    match save {
        Some(path) => Ok(path),
        None => Config::path()
            .ok_or_else(|| PlexhueError::Config("no config directory on this platform".into())),
    }
}

pub(super) fn cmd_config(
    config_path: Option<&Path>,
    save: Option<Option<PathBuf>>,
    json: bool,
) -> Result<()> {
    let (config, config_file) = super::load_config(config_path)?;
    let saved_to = match save {
        Some(target) => {
            let target = save_target(target)?;
            config.save_to(&target)?;
            log::info!("[config] saved to {}", target.display());
            Some(target)
        }
        None => None,
    };
    let problems: Vec<String> = match config.validate() {
        Ok(()) => vec![],
        Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
    };
    let shown = config.redacted();

    if json {
        let output = ConfigOutput {
            config_file: config_file.display().to_string(),
            settings: shown,
            problems,
            saved_to: saved_to.map(|p| p.display().to_string()),
        };
        let text = serde_json::to_string_pretty(&output)
            .map_err(|e| PlexhueError::Config(format!("JSON output: {e}")))?;
        println!("{text}");
        return Ok(());
    }

    let w = kv_width(
        &["Config file:", "Saved to:"],
        &[
            "PLEX_SERVER_IP:",
            "PLEX_PORT:",
            "PLEX_TOKEN:",
            "HUE_BRIDGE_IP:",
            "HUE_USERNAME:",
            "HUE_LIGHT_ID:",
            "POLL_INTERVAL_SECONDS:",
            "STATUS_TIMEOUT_SECONDS:",
            "LIGHT_TIMEOUT_SECONDS:",
            "RESTORE_ON_EXIT:",
            "ON_OFFLINE_COMMAND:",
            "ON_ONLINE_COMMAND:",
        ],
    );

    kv("Config file:", config_file.display(), w);
    if let Some(target) = &saved_to {
        kv("Saved to:", target.display(), w);
    }
    println!();

    let command_label = |cmd: &str| {
        if cmd.trim().is_empty() {
            "(disabled)".to_string()
        } else {
            cmd.to_string()
        }
    };

    println!("Settings:");
    kv_indent("PLEX_SERVER_IP:", &shown.plex_server_ip, w);
    kv_indent("PLEX_PORT:", shown.plex_port, w);
    kv_indent("PLEX_TOKEN:", &shown.plex_token, w);
    kv_indent("HUE_BRIDGE_IP:", &shown.hue_bridge_ip, w);
    kv_indent("HUE_USERNAME:", &shown.hue_username, w);
    kv_indent("HUE_LIGHT_ID:", &shown.hue_light_id, w);
    kv_indent("POLL_INTERVAL_SECONDS:", shown.poll_interval_seconds, w);
    kv_indent("STATUS_TIMEOUT_SECONDS:", shown.status_timeout_seconds, w);
    kv_indent("LIGHT_TIMEOUT_SECONDS:", shown.light_timeout_seconds, w);
    kv_indent("RESTORE_ON_EXIT:", shown.restore_on_exit, w);
    kv_indent("ON_OFFLINE_COMMAND:", command_label(&shown.on_offline_command), w);
    kv_indent("ON_ONLINE_COMMAND:", command_label(&shown.on_online_command), w);
    println!();

    if problems.is_empty() {
        println!("No problems found.");
    } else {
        println!("Problems:");
        for p in &problems {
            println!("  - {p}");
        }
    }
    Ok(())
}
