//! Hue bridge communication — trait + HTTP backend.

use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::light::LightState;

// ── Error type ──

/// Light-bridge errors.
///
/// String payloads follow the convention **"context: details"** where *context*
/// names the request (e.g. `"GET light"`, `"PUT state"`) and *details*
/// describes what went wrong.
#[derive(Debug)]
pub enum BridgeError {
    /// Connection refused, DNS failure, timeout, or client setup failure.
    Network(String),
    /// The bridge answered with a non-success HTTP status.
    Status(u16),
    /// The reply body could not be interpreted.
    Malformed(String),
    /// The bridge reported an API error (unauthorized user, unknown light, ...).
    Api(String),
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::Network(e) => write!(f, "Hue bridge unreachable: {e}"),
            BridgeError::Status(code) => write!(f, "Hue bridge returned HTTP {code}"),
            BridgeError::Malformed(e) => write!(f, "Malformed Hue bridge reply: {e}"),
            BridgeError::Api(e) => write!(f, "Hue bridge error: {e}"),
        }
    }
}

impl std::error::Error for BridgeError {}

pub type Result<T> = std::result::Result<T, BridgeError>;

// ── Trait ──

/// A single light reachable through a bridge.
pub trait LightBridge {
    /// Query the light's current state.
    fn light_state(&self) -> Result<LightState>;

    /// Push a new state to the light.
    fn set_light_state(&self, state: &LightState) -> Result<()>;
}

// ── HTTP backend ──

/// Hue bridge REST client bound to one light.
pub struct HueBridge {
    client: Client,
    light_url: String,
}

impl HueBridge {
    /// Create a client for `http://{bridge_addr}/api/{username}/lights/{light_id}`.
    pub fn new(
        bridge_addr: &str,
        username: &str,
        light_id: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::Network(format!("client setup: {e}")))?;
        Ok(Self {
            client,
            light_url: format!("http://{bridge_addr}/api/{username}/lights/{light_id}"),
        })
    }

    /// Create a client from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.hue_bridge_ip,
            &config.hue_username,
            &config.hue_light_id,
            config.light_timeout(),
        )
    }

    fn state_url(&self) -> String {
        format!("{}/state", self.light_url)
    }
}

impl LightBridge for HueBridge {
    fn light_state(&self) -> Result<LightState> {
        let resp = self
            .client
            .get(&self.light_url)
            .send()
            .map_err(|e| BridgeError::Network(format!("GET light: {}", describe_reqwest(e))))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(BridgeError::Status(status.as_u16()));
        }
        let body = resp
            .text()
            .map_err(|e| BridgeError::Network(format!("GET light body: {}", e.without_url())))?;
        parse_light_response(&body)
    }

    fn set_light_state(&self, state: &LightState) -> Result<()> {
        let resp = self
            .client
            .put(self.state_url())
            .json(state)
            .send()
            .map_err(|e| BridgeError::Network(format!("PUT state: {}", describe_reqwest(e))))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(BridgeError::Status(status.as_u16()));
        }
        let body = resp
            .text()
            .map_err(|e| BridgeError::Network(format!("PUT state body: {}", e.without_url())))?;
        parse_set_response(&body, state)
    }
}

/// Hue error type for attributes sent to a light that is being switched off.
const DEVICE_OFF_ERROR: u64 = 201;

/// Short description of a transport failure.
///
/// The request URL embeds the bridge username, so it is stripped.
fn describe_reqwest(e: reqwest::Error) -> String {
    if e.is_timeout() {
        "timed out".into()
    } else if e.is_connect() {
        format!("connection failed ({})", e.without_url())
    } else {
        e.without_url().to_string()
    }
}

/// Extract the first `[{"error": {"description": ...}}]` entry, if any.
///
/// With `ignore_device_off`, "device is set to off" errors are skipped.
fn api_error(value: &Value, ignore_device_off: bool) -> Option<String> {
    let error = value
        .as_array()?
        .iter()
        .filter_map(|entry| entry.get("error"))
        .find(|error| {
            !(ignore_device_off
                && error.get("type").and_then(Value::as_u64) == Some(DEVICE_OFF_ERROR))
        })?;
    Some(
        error
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("unspecified error")
            .to_string(),
    )
}

/// Parse a `GET /lights/{id}` reply into the four mirrored attributes.
pub fn parse_light_response(body: &str) -> Result<LightState> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| BridgeError::Malformed(format!("GET light: {e}")))?;
    if let Some(desc) = api_error(&value, false) {
        return Err(BridgeError::Api(desc));
    }
    let state = value
        .get("state")
        .ok_or_else(|| BridgeError::Malformed("GET light: missing `state`".into()))?;
    LightState::deserialize(state).map_err(|e| BridgeError::Malformed(format!("GET light: {e}")))
}

/// Check a `PUT /lights/{id}/state` reply for per-attribute errors.
///
/// Switching a light off makes the bridge reject `bri`/`hue`/`sat` with
/// type 201 while `on` still succeeds; those rejections are not failures.
pub fn parse_set_response(body: &str, sent: &LightState) -> Result<()> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| BridgeError::Malformed(format!("PUT state: {e}")))?;
    match api_error(&value, !sent.on) {
        Some(desc) => Err(BridgeError::Api(desc)),
        None => Ok(()),
    }
}

// ── Mock bridge ──

pub mod mock {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// In-memory light for unit tests. Records every query and update.
    pub struct MockBridge {
        /// Current light state. `None` makes queries fail (bridge unreachable).
        pub state: RefCell<Option<LightState>>,
        /// Number of `light_state` calls.
        pub queries: Cell<usize>,
        /// Every state passed to `set_light_state`, in order.
        pub updates: RefCell<Vec<LightState>>,
        /// If true, `set_light_state` fails without changing the light.
        pub fail_updates: Cell<bool>,
    }

    impl MockBridge {
        pub fn new(state: Option<LightState>) -> Self {
            Self {
                state: RefCell::new(state),
                queries: Cell::new(0),
                updates: RefCell::new(Vec::new()),
                fail_updates: Cell::new(false),
            }
        }

        /// Change the light behind the monitor's back (e.g. a wall switch).
        pub fn set(&self, state: Option<LightState>) {
            *self.state.borrow_mut() = state;
        }

        /// The light as it currently stands.
        pub fn current(&self) -> Option<LightState> {
            *self.state.borrow()
        }

        /// Total number of bridge calls (queries + updates).
        pub fn call_count(&self) -> usize {
            self.queries.get() + self.updates.borrow().len()
        }

        /// Forget recorded calls, keeping the light state.
        pub fn clear_calls(&self) {
            self.queries.set(0);
            self.updates.borrow_mut().clear();
        }
    }

    impl LightBridge for MockBridge {
        fn light_state(&self) -> Result<LightState> {
            self.queries.set(self.queries.get() + 1);
            self.current()
                .ok_or_else(|| BridgeError::Network("GET light: mock bridge unreachable".into()))
        }

        fn set_light_state(&self, state: &LightState) -> Result<()> {
            self.updates.borrow_mut().push(*state);
            if self.fail_updates.get() {
                return Err(BridgeError::Network(
                    "PUT state: mock bridge unreachable".into(),
                ));
            }
            *self.state.borrow_mut() = Some(*state);
            Ok(())
        }
    }
}
