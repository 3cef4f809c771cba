//! Transition hooks: user commands run when Plex goes down or comes back.
//!
//! The command sees `PLEXHUE_EVENT` (`offline` or `online`) and
//! `PLEXHUE_LIGHT_ID` in its environment.

use std::fmt;
use std::io;
use std::process::{Child, Command, ExitStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::monitor::MonitorAction;

/// Set while a hook process is alive; one hook at a time.
static HOOK_RUNNING: AtomicBool = AtomicBool::new(false);

/// Hooks still running after this long are killed.
const HOOK_TIMEOUT: Duration = Duration::from_secs(30);

const EXIT_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Status change a hook reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    Offline,
    Online,
}

impl HookEvent {
    /// Offline fires for both alert outcomes; the light's state does not matter.
    pub fn from_action(action: MonitorAction) -> Option<Self> {
        match action {
            MonitorAction::ApplyAlert | MonitorAction::DeferAlert => Some(HookEvent::Offline),
            MonitorAction::Restore => Some(HookEvent::Online),
            MonitorAction::NoChange => None,
        }
    }

    /// The configured command for this event.
    pub fn command(self, config: &Config) -> &str {
        match self {
            HookEvent::Offline => &config.on_offline_command,
            HookEvent::Online => &config.on_online_command,
        }
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookEvent::Offline => write!(f, "offline"),
            HookEvent::Online => write!(f, "online"),
        }
    }
}

/// Fire the hook for a cycle's action, if one is configured.
///
/// Returns whether a command was started. The poll loop never waits for it.
pub fn run_action_hook(action: MonitorAction, config: &Config) -> bool {
    let Some(event) = HookEvent::from_action(action) else {
        return false;
    };
    let command = event.command(config).trim();
    if command.is_empty() {
        return false;
    }
    spawn_hook(event, command, &config.hue_light_id)
}

fn spawn_hook(event: HookEvent, command: &str, light_id: &str) -> bool {
    if HOOK_RUNNING
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        log::warn!("[hook] {event} hook skipped, previous hook still running");
        return false;
    }

    let child = match shell(command)
        .env("PLEXHUE_EVENT", event.to_string())
        .env("PLEXHUE_LIGHT_ID", light_id)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            HOOK_RUNNING.store(false, Ordering::SeqCst);
            log::warn!("[hook] {event} hook could not start: {e}");
            return false;
        }
    };

    log::debug!("[hook] {event}: {command}");
    std::thread::spawn(move || {
        let result = wait_with_timeout(child, HOOK_TIMEOUT);
        HOOK_RUNNING.store(false, Ordering::SeqCst);
        match result {
            Ok(Some(status)) if !status.success() => {
                log::warn!("[hook] {event} hook exited with {status}")
            }
            Ok(Some(_)) => {}
            Ok(None) => log::warn!("[hook] {event} hook killed after {HOOK_TIMEOUT:?}"),
            Err(e) => log::warn!("[hook] {event} hook failed: {e}"),
        }
    });
    true
}

fn shell(command: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

/// Wait for `child` to exit. `Ok(None)` means it was killed at the deadline.
fn wait_with_timeout(mut child: Child, timeout: Duration) -> io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            child.wait()?;
            return Ok(None);
        }
        std::thread::sleep(EXIT_CHECK_INTERVAL);
    }
}
