//! Light state model — the four Hue attributes mirrored by the monitor.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum brightness / saturation accepted by the Hue API.
pub const HUE_MAX_LEVEL: u8 = 254;

/// Visual state of a single Hue light.
///
/// Serializes to the bridge's `{on, bri, hue, sat}` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightState {
    pub on: bool,
    /// Brightness, 0-254.
    pub bri: u8,
    /// Hue angle on the bridge's 0-65535 wheel.
    pub hue: u16,
    /// Saturation, 0-254.
    pub sat: u8,
}

/// Full-brightness red, shown while the media server is offline.
pub const ALERT_STATE: LightState = LightState {
    on: true,
    bri: HUE_MAX_LEVEL,
    hue: 0,
    sat: HUE_MAX_LEVEL,
};

impl LightState {
    /// Whether this is the red alert state.
    pub fn is_alert(&self) -> bool {
        *self == ALERT_STATE
    }
}

impl fmt::Display for LightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.on {
            write!(f, "on (bri {}, hue {}, sat {})", self.bri, self.hue, self.sat)
        } else {
            write!(f, "off")
        }
    }
}

/// Format an optional light state, with `unknown` for a failed query.
///
/// The alert state is tagged so a light left red is easy to spot.
pub fn format_light(state: Option<&LightState>) -> String {
    match state {
        Some(s) if s.is_alert() => format!("{s} [alert]"),
        Some(s) => s.to_string(),
        None => "unknown".into(),
    }
}
