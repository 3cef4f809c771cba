//! Monitor state machine — availability-to-light logic decoupled from I/O.
//!
//! [`AvailabilityMonitor`] tracks the last seen server status, the light
//! state to restore, and whether an alert is waiting for the light to be
//! switched on. Each [`poll`](AvailabilityMonitor::poll) is one iteration of
//! the loop: pending-alert check, status probe, and (only on a status change)
//! alert or restore. The binary is a thin adapter around [`run`](AvailabilityMonitor::run).

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::bridge::LightBridge;
use crate::clock::Clock;
use crate::light::{ALERT_STATE, LightState};
use crate::server::ServerStatus;

/// Longest single sleep while waiting out the poll interval.
pub const SLEEP_SLICE: Duration = Duration::from_millis(250);

/// What a status transition did to the light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorAction {
    /// Status unchanged — no light calls.
    NoChange,
    /// Went offline while the light was on: alert shown.
    ApplyAlert,
    /// Went offline while the light was off or unreadable: alert deferred.
    DeferAlert,
    /// Came back online: saved state put back.
    Restore,
}

/// Outcome of one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// A deferred alert was shown this cycle because the light is now on.
    pub deferred_alert_applied: bool,
    pub action: MonitorAction,
}

/// In-memory loop state. Lost on exit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorState {
    /// Last observed classification.
    pub server_was_offline: bool,
    /// An alert is waiting for the light to be switched on.
    pub pending_notification: bool,
    /// State to put back when the server returns. `None` = unknown.
    pub saved_light_state: Option<LightState>,
}

/// Mirrors server availability onto one light.
pub struct AvailabilityMonitor {
    state: MonitorState,
    alert: LightState,
}

impl Default for AvailabilityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl AvailabilityMonitor {
    /// Start assuming the server is online, nothing pending, nothing saved.
    pub fn new() -> Self {
        Self {
            state: MonitorState::default(),
            alert: ALERT_STATE,
        }
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Whether the light is currently expected to show the alert.
    pub fn is_alert_showing(&self) -> bool {
        self.state.server_was_offline
            && !self.state.pending_notification
            && self.state.saved_light_state.is_some()
    }

    /// Run one iteration: pending check, status probe, transition handling.
    pub fn poll(&mut self, server: &impl ServerStatus, bridge: &impl LightBridge) -> CycleReport {
        let deferred_alert_applied = self.apply_pending_alert(bridge);

        let offline = server.is_offline();
        if offline == self.state.server_was_offline {
            return CycleReport {
                deferred_alert_applied,
                action: MonitorAction::NoChange,
            };
        }
        self.state.server_was_offline = offline;

        let action = if offline {
            self.on_offline(bridge)
        } else {
            self.on_online(bridge)
        };
        CycleReport {
            deferred_alert_applied,
            action,
        }
    }

    /// Show a deferred alert once the light reads as on.
    fn apply_pending_alert(&mut self, bridge: &impl LightBridge) -> bool {
        if !self.state.pending_notification {
            return false;
        }
        match query_light(bridge) {
            Some(light) if light.on => {
                self.state.saved_light_state = Some(light);
                send_light(bridge, &self.alert);
                self.state.pending_notification = false;
                log::debug!("[hue] light switched on, showing deferred alert");
                true
            }
            Some(_) => {
                log::debug!("[hue] light still off, alert stays pending");
                false
            }
            None => false,
        }
    }

    fn on_offline(&mut self, bridge: &impl LightBridge) -> MonitorAction {
        let light = query_light(bridge);
        if light.is_some_and(|l| l.is_alert()) {
            log::warn!("[hue] light already shows the alert; recovery will leave it red");
        }
        self.state.saved_light_state = light;
        match light {
            Some(l) if l.on => {
                send_light(bridge, &self.alert);
                log::debug!("[plex] offline, light {l} -> alert");
                MonitorAction::ApplyAlert
            }
            _ => {
                self.state.pending_notification = true;
                log::debug!("[plex] offline, light off or unreadable -> alert deferred");
                MonitorAction::DeferAlert
            }
        }
    }

    fn on_online(&mut self, bridge: &impl LightBridge) -> MonitorAction {
        self.state.pending_notification = false;
        match self.state.saved_light_state.take() {
            Some(saved) => {
                send_light(bridge, &saved);
                log::debug!("[plex] online, light restored -> {saved}");
            }
            None => log::warn!("[plex] online, but no saved light state to restore"),
        }
        MonitorAction::Restore
    }

    /// Put the saved state back if the alert is on display. Returns whether
    /// a restore was sent.
    pub fn restore_on_exit(&mut self, bridge: &impl LightBridge) -> bool {
        if !self.is_alert_showing() {
            return false;
        }
        match self.state.saved_light_state.take() {
            Some(saved) => {
                send_light(bridge, &saved);
                true
            }
            None => false,
        }
    }

    /// Poll every `interval` until `running` is cleared or the clock ends.
    ///
    /// `on_cycle` sees every report (for output and hooks).
    pub fn run(
        &mut self,
        server: &impl ServerStatus,
        bridge: &impl LightBridge,
        clock: &impl Clock,
        interval: Duration,
        running: &AtomicBool,
        mut on_cycle: impl FnMut(&CycleReport),
    ) {
        while running.load(Ordering::SeqCst) && !clock.is_ended() {
            wait_interval(clock, interval, running);
            if !running.load(Ordering::SeqCst) {
                break;
            }
            let report = self.poll(server, bridge);
            on_cycle(&report);
        }
    }
}

/// Sleep for `interval` in slices of at most [`SLEEP_SLICE`], stopping early
/// when `running` is cleared.
pub fn wait_interval(clock: &impl Clock, interval: Duration, running: &AtomicBool) {
    let mut remaining = interval;
    while !remaining.is_zero() && running.load(Ordering::SeqCst) {
        let step = remaining.min(SLEEP_SLICE);
        clock.sleep(step);
        remaining -= step;
    }
}

/// Read the light, logging and discarding failures.
fn query_light(bridge: &impl LightBridge) -> Option<LightState> {
    match bridge.light_state() {
        Ok(state) => Some(state),
        Err(e) => {
            log::warn!("[hue] could not read light state: {e}");
            None
        }
    }
}

/// Set the light, logging and discarding failures.
fn send_light(bridge: &impl LightBridge, state: &LightState) {
    if let Err(e) = bridge.set_light_state(state) {
        log::warn!("[hue] could not set light state: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::mock::MockBridge;
    use crate::clock::SimulatedClock;
    use crate::server::stub::StubServer;

    const WHITE: LightState = LightState {
        on: true,
        bri: 254,
        hue: 8418,
        sat: 140,
    };

    const OFF: LightState = LightState {
        on: false,
        bri: 120,
        hue: 8418,
        sat: 140,
    };

    #[test]
    fn initial_state() {
        let m = AvailabilityMonitor::new();
        assert_eq!(m.state(), &MonitorState::default());
        assert!(!m.is_alert_showing());
    }

    #[test]
    fn online_polls_make_no_light_calls() {
        let mut m = AvailabilityMonitor::new();
        let server = StubServer::new(false);
        let bridge = MockBridge::new(Some(WHITE));
        for _ in 0..10 {
            let report = m.poll(&server, &bridge);
            assert_eq!(report.action, MonitorAction::NoChange);
            assert!(!report.deferred_alert_applied);
        }
        assert_eq!(bridge.call_count(), 0);
        assert_eq!(server.probes(), 10);
    }

    #[test]
    fn offline_with_light_on_applies_alert_once() {
        let mut m = AvailabilityMonitor::new();
        let server = StubServer::new(true);
        let bridge = MockBridge::new(Some(WHITE));

        assert_eq!(m.poll(&server, &bridge).action, MonitorAction::ApplyAlert);
        assert_eq!(bridge.updates.borrow().as_slice(), &[ALERT_STATE]);
        assert_eq!(m.state().saved_light_state, Some(WHITE));
        assert!(!m.state().pending_notification);
        assert!(m.is_alert_showing());

        // Staying offline does not touch the light again
        bridge.clear_calls();
        for _ in 0..5 {
            assert_eq!(m.poll(&server, &bridge).action, MonitorAction::NoChange);
        }
        assert_eq!(bridge.call_count(), 0);
    }

    #[test]
    fn light_left_red_is_saved_as_is() {
        let mut m = AvailabilityMonitor::new();
        let server = StubServer::scripted([true, false]);
        let bridge = MockBridge::new(Some(ALERT_STATE));

        assert_eq!(m.poll(&server, &bridge).action, MonitorAction::ApplyAlert);
        assert!(m.state().saved_light_state.is_some_and(|l| l.is_alert()));
        assert_eq!(m.poll(&server, &bridge).action, MonitorAction::Restore);
        assert_eq!(bridge.current(), Some(ALERT_STATE));
    }

    #[test]
    fn offline_with_light_off_defers_alert() {
        let mut m = AvailabilityMonitor::new();
        let server = StubServer::new(true);
        let bridge = MockBridge::new(Some(OFF));

        assert_eq!(m.poll(&server, &bridge).action, MonitorAction::DeferAlert);
        assert!(bridge.updates.borrow().is_empty());
        assert!(m.state().pending_notification);
        assert_eq!(m.state().saved_light_state, Some(OFF));
        assert!(!m.is_alert_showing());
    }

    #[test]
    fn offline_with_unreadable_light_defers_alert() {
        let mut m = AvailabilityMonitor::new();
        let server = StubServer::new(true);
        let bridge = MockBridge::new(None);

        assert_eq!(m.poll(&server, &bridge).action, MonitorAction::DeferAlert);
        assert!(bridge.updates.borrow().is_empty());
        assert!(m.state().pending_notification);
        assert_eq!(m.state().saved_light_state, None);
    }

    #[test]
    fn pending_alert_applied_when_light_turned_on() {
        let mut m = AvailabilityMonitor::new();
        let server = StubServer::new(true);
        let bridge = MockBridge::new(Some(OFF));
        m.poll(&server, &bridge);

        // Still off: stays pending, nothing set
        let report = m.poll(&server, &bridge);
        assert!(!report.deferred_alert_applied);
        assert!(m.state().pending_notification);
        assert!(bridge.updates.borrow().is_empty());

        // User switches the light on
        bridge.set(Some(WHITE));
        let report = m.poll(&server, &bridge);
        assert!(report.deferred_alert_applied);
        assert_eq!(report.action, MonitorAction::NoChange);
        assert!(!m.state().pending_notification);
        assert_eq!(m.state().saved_light_state, Some(WHITE));
        assert_eq!(bridge.updates.borrow().as_slice(), &[ALERT_STATE]);
    }

    #[test]
    fn pending_alert_survives_query_failure() {
        let mut m = AvailabilityMonitor::new();
        let server = StubServer::new(true);
        let bridge = MockBridge::new(None);
        m.poll(&server, &bridge);

        let report = m.poll(&server, &bridge);
        assert!(!report.deferred_alert_applied);
        assert!(m.state().pending_notification);
    }

    #[test]
    fn online_restores_saved_state() {
        let mut m = AvailabilityMonitor::new();
        let server = StubServer::new(true);
        let bridge = MockBridge::new(Some(WHITE));
        m.poll(&server, &bridge);

        server.set(false);
        assert_eq!(m.poll(&server, &bridge).action, MonitorAction::Restore);
        assert_eq!(bridge.updates.borrow().as_slice(), &[ALERT_STATE, WHITE]);
        assert_eq!(bridge.current(), Some(WHITE));
        assert!(!m.state().server_was_offline);
        assert!(!m.is_alert_showing());
    }

    #[test]
    fn online_clears_pending_and_restores_off_state() {
        let mut m = AvailabilityMonitor::new();
        let server = StubServer::new(true);
        let bridge = MockBridge::new(Some(OFF));
        m.poll(&server, &bridge);

        server.set(false);
        assert_eq!(m.poll(&server, &bridge).action, MonitorAction::Restore);
        assert!(!m.state().pending_notification);
        assert_eq!(bridge.updates.borrow().as_slice(), &[OFF]);
    }

    #[test]
    fn online_without_saved_state_sends_nothing() {
        let mut m = AvailabilityMonitor::new();
        let server = StubServer::new(true);
        let bridge = MockBridge::new(None);
        m.poll(&server, &bridge);

        server.set(false);
        assert_eq!(m.poll(&server, &bridge).action, MonitorAction::Restore);
        assert!(bridge.updates.borrow().is_empty());
        assert!(!m.state().pending_notification);
    }

    #[test]
    fn failed_alert_update_does_not_desync_status() {
        let mut m = AvailabilityMonitor::new();
        let server = StubServer::new(true);
        let bridge = MockBridge::new(Some(WHITE));
        bridge.fail_updates.set(true);

        assert_eq!(m.poll(&server, &bridge).action, MonitorAction::ApplyAlert);
        assert!(m.state().server_was_offline);
        assert_eq!(m.poll(&server, &bridge).action, MonitorAction::NoChange);
    }

    // ── restore_on_exit ──

    #[test]
    fn restore_on_exit_while_alert_showing() {
        let mut m = AvailabilityMonitor::new();
        let server = StubServer::new(true);
        let bridge = MockBridge::new(Some(WHITE));
        m.poll(&server, &bridge);

        assert!(m.restore_on_exit(&bridge));
        assert_eq!(bridge.current(), Some(WHITE));
        assert!(!m.restore_on_exit(&bridge), "second restore is a no-op");
    }

    #[test]
    fn restore_on_exit_skipped_when_pending() {
        let mut m = AvailabilityMonitor::new();
        let server = StubServer::new(true);
        let bridge = MockBridge::new(Some(OFF));
        m.poll(&server, &bridge);

        assert!(!m.restore_on_exit(&bridge));
        assert!(bridge.updates.borrow().is_empty());
    }

    #[test]
    fn restore_on_exit_skipped_when_online() {
        let mut m = AvailabilityMonitor::new();
        let bridge = MockBridge::new(Some(WHITE));
        assert!(!m.restore_on_exit(&bridge));
        assert_eq!(bridge.call_count(), 0);
    }

    // ── run / wait_interval ──

    #[test]
    fn wait_interval_sleeps_in_slices() {
        let clock = SimulatedClock::new();
        let running = AtomicBool::new(true);
        wait_interval(&clock, Duration::from_secs(1), &running);
        assert_eq!(clock.elapsed(), Duration::from_secs(1));
        assert_eq!(clock.sleeps(), 4);
    }

    #[test]
    fn wait_interval_returns_immediately_when_stopped() {
        let clock = SimulatedClock::new();
        let running = AtomicBool::new(false);
        wait_interval(&clock, Duration::from_secs(60), &running);
        assert_eq!(clock.sleeps(), 0);
    }

    #[test]
    fn run_polls_once_per_interval() {
        let mut m = AvailabilityMonitor::new();
        let server = StubServer::new(false);
        let bridge = MockBridge::new(Some(WHITE));
        let clock = SimulatedClock::until(Duration::from_secs(300));
        let running = AtomicBool::new(true);

        let mut cycles = 0;
        m.run(
            &server,
            &bridge,
            &clock,
            Duration::from_secs(60),
            &running,
            |_| cycles += 1,
        );
        assert_eq!(cycles, 5);
        assert_eq!(server.probes(), 5);
        assert_eq!(clock.elapsed(), Duration::from_secs(300));
    }

    #[test]
    fn run_stops_when_flag_cleared() {
        let mut m = AvailabilityMonitor::new();
        let server = StubServer::new(false);
        let bridge = MockBridge::new(None);
        let clock = SimulatedClock::new();
        let running = AtomicBool::new(true);

        let mut cycles = 0;
        m.run(
            &server,
            &bridge,
            &clock,
            Duration::from_secs(1),
            &running,
            |_| {
                cycles += 1;
                if cycles == 3 {
                    running.store(false, Ordering::SeqCst);
                }
            },
        );
        assert_eq!(cycles, 3);
    }
}
