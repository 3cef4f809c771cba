//! `monitor` subcommand — mirror Plex availability onto the light until Ctrl+C.

use std::path::Path;

use super::{Config, HueBridge, PlexServer, RUNNING, Result};
use plexhue_lib::clock::SystemClock;
use plexhue_lib::hooks;
use plexhue_lib::monitor::{AvailabilityMonitor, CycleReport, MonitorAction};

/// Print one line per cycle that changed something.
fn report_cycle(report: &CycleReport) {
    if report.deferred_alert_applied {
        println!("  LIGHT ON -> alert (deferred)");
    }
    match report.action {
        MonitorAction::ApplyAlert => println!("  OFFLINE -> alert"),
        MonitorAction::DeferAlert => println!("  OFFLINE -> light off, alert deferred"),
        MonitorAction::Restore => println!("  ONLINE  -> light restored"),
        MonitorAction::NoChange => {}
    }
}

fn print_banner(config: &Config, config_file: &Path, server: &PlexServer) {
    println!("plexhue — Hue light {} turns red while Plex is offline.", config.hue_light_id);
    println!("[config] {}", config_file.display());
    println!("[plex]   {}", server.redacted_url());
    println!("[hue]    {}", config.hue_bridge_ip);
    println!("[poll]   every {}s", config.poll_interval_seconds);
    println!("Press Ctrl+C to exit.");
    println!();
}

/// Restore the light on exit if the alert is still up.
fn monitor_teardown(monitor: &mut AvailabilityMonitor, bridge: &HueBridge, config: &Config) {
    println!();
    if config.restore_on_exit && monitor.restore_on_exit(bridge) {
        println!("Restored light state.");
    }
    println!("Done.");
}

pub(super) fn cmd_monitor(config_path: Option<&Path>) -> Result<()> {
    let (config, config_file) = super::load_valid_config(config_path)?;
    let server = PlexServer::from_config(&config)?;
    let bridge = HueBridge::from_config(&config)?;

    print_banner(&config, &config_file, &server);

    let mut monitor = AvailabilityMonitor::new();
    monitor.run(
        &server,
        &bridge,
        &SystemClock,
        config.poll_interval(),
        &RUNNING,
        |report| {
            report_cycle(report);
            hooks::run_action_hook(report.action, &config);
        },
    );

    monitor_teardown(&mut monitor, &bridge, &config);
    Ok(())
}
