//! `status` subcommand — probe Plex and read the light once.

use std::path::Path;

use super::{
    HueBridge, LightBridge, LightStatusJson, PlexServer, PlexStatusJson, Result, StatusOutput, kv,
    kv_indent, kv_width, light,
};

pub(super) fn cmd_status(config_path: Option<&Path>, json: bool) -> Result<()> {
    let (config, config_file) = super::load_valid_config(config_path)?;
    let server = PlexServer::from_config(&config)?;
    let bridge = HueBridge::from_config(&config)?;

    let plex = server.probe();
    let light_state = bridge.light_state();

    if json {
        let output = StatusOutput {
            version: env!("CARGO_PKG_VERSION").into(),
            config_file: config_file.display().to_string(),
            plex: PlexStatusJson {
                url: server.redacted_url(),
                online: plex.is_ok(),
                error: plex.as_ref().err().map(|e| e.to_string()),
            },
            light: LightStatusJson {
                id: config.hue_light_id.clone(),
                state: light_state.as_ref().ok().copied(),
                error: light_state.as_ref().err().map(|e| e.to_string()),
            },
        };
        let text = serde_json::to_string_pretty(&output)
            .map_err(|e| plexhue_lib::PlexhueError::Config(format!("JSON output: {e}")))?;
        println!("{text}");
        return Ok(());
    }

    let w = kv_width(
        &["Version:", "Config file:", "Plex:", "Light:"],
        &["URL:", "Status:", "Bridge:", "ID:", "State:"],
    );
    kv("Version:", env!("CARGO_PKG_VERSION"), w);
    kv("Config file:", config_file.display(), w);
    println!();

    println!("Plex:");
    kv_indent("URL:", server.redacted_url(), w);
    match &plex {
        Ok(()) => kv_indent("Status:", "online", w),
        Err(e) => kv_indent("Status:", format_args!("offline ({e})"), w),
    }
    println!();

    println!("Light:");
    kv_indent("Bridge:", &config.hue_bridge_ip, w);
    kv_indent("ID:", &config.hue_light_id, w);
    match &light_state {
        Ok(state) => kv_indent("State:", light::format_light(Some(state)), w),
        Err(e) => kv_indent("State:", format_args!("{} ({e})", light::format_light(None)), w),
    }
    Ok(())
}
