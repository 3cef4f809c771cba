//! Plex Media Server availability probe — trait + HTTP backend.
//!
//! The monitor only needs a yes/no answer, so [`ServerStatus::is_offline`]
//! folds every failure into "offline". [`PlexServer::probe`] keeps the
//! detailed error for the `status` command and for logging.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;

use crate::config::Config;

/// Media-server probe errors.
#[derive(Debug)]
pub enum ServerError {
    /// Timeout, connection refused, DNS failure, or client setup failure.
    Network(String),
    /// The server answered with something other than `200 OK`.
    Status(u16),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Network(e) => write!(f, "Plex server unreachable: {e}"),
            ServerError::Status(code) => write!(f, "Plex server returned HTTP {code}"),
        }
    }
}

impl std::error::Error for ServerError {}

pub type Result<T> = std::result::Result<T, ServerError>;

/// Something whose reachability is being watched.
pub trait ServerStatus {
    /// `true` when the server should be treated as down. Never fails.
    fn is_offline(&self) -> bool;
}

/// Plex `/status/sessions` probe.
pub struct PlexServer {
    client: Client,
    base_url: String,
    token: String,
}

impl PlexServer {
    /// Create a probe for `http://{addr}/status/sessions` (`addr` is `host:port`).
    pub fn new(addr: &str, token: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServerError::Network(format!("client setup: {e}")))?;
        Ok(Self {
            client,
            base_url: format!("http://{addr}/status/sessions"),
            token: token.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &format!("{}:{}", config.plex_server_ip, config.plex_port),
            &config.plex_token,
            config.status_timeout(),
        )
    }

    /// Status URL with the token masked, safe for logs.
    pub fn redacted_url(&self) -> String {
        format!("{}?X-Plex-Token=***", self.base_url)
    }

    /// Issue one status request.
    pub fn probe(&self) -> Result<()> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("X-Plex-Token", self.token.as_str())])
            .send()
            .map_err(|e| {
                let detail = if e.is_timeout() {
                    "timed out".to_string()
                } else {
                    // reqwest includes the URL (and token) in its message
                    e.without_url().to_string()
                };
                ServerError::Network(detail)
            })?;
        match resp.status() {
            StatusCode::OK => Ok(()),
            other => Err(ServerError::Status(other.as_u16())),
        }
    }
}

impl ServerStatus for PlexServer {
    fn is_offline(&self) -> bool {
        match self.probe() {
            Ok(()) => false,
            Err(e) => {
                log::warn!("[plex] {e} ({})", self.redacted_url());
                true
            }
        }
    }
}

// ── Test stub ──

/// Scriptable [`ServerStatus`] for unit and integration tests.
///
/// Holds a sequence of offline flags; each probe pops the next value. When
/// the sequence is exhausted, the last value is repeated.
pub mod stub {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    pub struct StubServer {
        script: RefCell<VecDeque<bool>>,
        last: Cell<bool>,
        probes: Cell<usize>,
    }

    impl StubServer {
        /// A server that keeps answering `offline`.
        pub fn new(offline: bool) -> Self {
            Self::scripted([offline])
        }

        /// A server that answers the given offline flags in order.
        pub fn scripted(script: impl IntoIterator<Item = bool>) -> Self {
            let script: VecDeque<bool> = script.into_iter().collect();
            let last = script.back().copied().unwrap_or(false);
            Self {
                script: RefCell::new(script),
                last: Cell::new(last),
                probes: Cell::new(0),
            }
        }

        /// Replace the script with a constant answer.
        pub fn set(&self, offline: bool) {
            self.script.borrow_mut().clear();
            self.last.set(offline);
        }

        /// Number of probes issued so far.
        pub fn probes(&self) -> usize {
            self.probes.get()
        }
    }

    impl ServerStatus for StubServer {
        fn is_offline(&self) -> bool {
            self.probes.set(self.probes.get() + 1);
            if let Some(next) = self.script.borrow_mut().pop_front() {
                self.last.set(next);
            }
            self.last.get()
        }
    }
}
