//! Application configuration — JSON or TOML file, upper-case keys.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{PlexhueError, Result};

/// First line of every TOML file written by [`Config::save_to`].
const TOML_HEADER: &str = "# plexhue configuration\n\n";

/// Legacy config file name, looked up in the working directory first.
pub const LOCAL_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Config {
    /// Plex Media Server host name or IP address.
    pub plex_server_ip: String,

    /// `X-Plex-Token` used for the status request.
    pub plex_token: String,

    /// Hue bridge host name or IP address (optionally `host:port`).
    pub hue_bridge_ip: String,

    /// Whitelisted Hue API user name.
    pub hue_username: String,

    /// Light identifier on the bridge. Accepts a JSON number or string.
    #[serde(deserialize_with = "string_or_number")]
    pub hue_light_id: String,

    /// Seconds between polls. Fractions are allowed (`0.5`, `60.0`).
    pub poll_interval_seconds: f64,

    /// Plex HTTP port. Default: 32400.
    #[serde(default = "default_plex_port")]
    pub plex_port: u16,

    /// Timeout for the Plex status request. Default: 3 seconds.
    #[serde(default = "default_status_timeout")]
    pub status_timeout_seconds: u64,

    /// Timeout for Hue bridge requests. Default: 5 seconds.
    #[serde(default = "default_light_timeout")]
    pub light_timeout_seconds: u64,

    /// Put the saved light state back when stopped while the alert is showing.
    #[serde(default = "default_true")]
    pub restore_on_exit: bool,

    /// Command to run when Plex goes offline. Empty = disabled.
    #[serde(default)]
    pub on_offline_command: String,

    /// Command to run when Plex comes back online. Empty = disabled.
    #[serde(default)]
    pub on_online_command: String,
}

fn default_plex_port() -> u16 {
    32400
}
fn default_status_timeout() -> u64 {
    3
}
fn default_light_timeout() -> u64 {
    5
}
fn default_true() -> bool {
    true
}

/// Hue light ids are strings in the API but often written as numbers.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

impl Default for Config {
    fn default() -> Self {
        Config {
            plex_server_ip: String::new(),
            plex_token: String::new(),
            hue_bridge_ip: String::new(),
            hue_username: String::new(),
            hue_light_id: String::new(),
            poll_interval_seconds: 60.0,
            plex_port: default_plex_port(),
            status_timeout_seconds: default_status_timeout(),
            light_timeout_seconds: default_light_timeout(),
            restore_on_exit: true,
            on_offline_command: String::new(),
            on_online_command: String::new(),
        }
    }
}

/// On-disk format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// `.toml` is TOML; everything else is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

/// Validation errors that [`Config::validate`] can return.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required text field is empty or whitespace-only.
    EmptyField(&'static str),
    /// A host field holds something other than `host` or `host:port`.
    InvalidHost { field: &'static str, reason: String },
    /// `POLL_INTERVAL_SECONDS` is zero, negative, or not a usable number.
    InvalidPollInterval(f64),
    /// A timeout field is zero.
    ZeroTimeout(&'static str),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{field} cannot be empty"),
            ValidationError::InvalidHost { field, reason } => {
                write!(f, "Invalid {field}: {reason}")
            }
            ValidationError::InvalidPollInterval(v) => {
                write!(f, "POLL_INTERVAL_SECONDS must be a positive number of seconds, got {v}")
            }
            ValidationError::ZeroTimeout(field) => write!(f, "{field} must be at least 1"),
        }
    }
}

impl Config {
    /// Platform-specific config directory.
    pub fn dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("plexhue"))
    }

    /// Full path to the platform config file.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    /// Config file to use when none is given: `config.json` in `cwd` if it
    /// exists, otherwise the platform path.
    pub fn resolve_path(cwd: &Path) -> Option<PathBuf> {
        let local = cwd.join(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Some(local);
        }
        Self::path()
    }

    /// Parse config text in the given format.
    pub fn parse(contents: &str, format: ConfigFormat) -> Result<Self> {
        match format {
            ConfigFormat::Json => serde_json::from_str(contents)
                .map_err(|e| PlexhueError::Config(format!("invalid JSON: {e}"))),
            ConfigFormat::Toml => toml::from_str(contents)
                .map_err(|e| PlexhueError::Config(format!("invalid TOML: {e}"))),
        }
    }

    /// Load config from a file. Missing files and missing keys are errors.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PlexhueError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::parse(&contents, ConfigFormat::from_path(path)).map_err(|e| match e {
            PlexhueError::Config(msg) => PlexhueError::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    /// Write the config to `path` in the format its extension selects.
    ///
    /// TOML gets a header comment; JSON is pretty-printed. The file is
    /// written next to the target and renamed into place.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = match ConfigFormat::from_path(path) {
            ConfigFormat::Toml => {
                let body = toml::to_string_pretty(self)
                    .map_err(|e| PlexhueError::Config(format!("cannot encode TOML: {e}")))?;
                format!("{TOML_HEADER}{body}")
            }
            ConfigFormat::Json => {
                let mut body = serde_json::to_string_pretty(self)
                    .map_err(|e| PlexhueError::Config(format!("cannot encode JSON: {e}")))?;
                body.push('\n');
                body
            }
        };

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let mut staged = path.as_os_str().to_owned();
        staged.push(".partial");
        let staged = PathBuf::from(staged);
        std::fs::write(&staged, &contents)?;
        if std::fs::rename(&staged, path).is_err() {
            // Cross-device targets cannot be renamed onto
            std::fs::remove_file(&staged).ok();
            std::fs::write(path, &contents)?;
        }
        Ok(())
    }

    /// Poll interval as a `Duration`; zero if the value failed validation.
    pub fn poll_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.poll_interval_seconds).unwrap_or_default()
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_secs(self.status_timeout_seconds)
    }

    pub fn light_timeout(&self) -> Duration {
        Duration::from_secs(self.light_timeout_seconds)
    }

    /// Copy with the Plex token masked, for display.
    pub fn redacted(&self) -> Self {
        let mut c = self.clone();
        if !c.plex_token.is_empty() {
            c.plex_token = "***".into();
        }
        c
    }

    /// Validate the entire config, collecting all errors.
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let hosts = [
            ("PLEX_SERVER_IP", &self.plex_server_ip),
            ("HUE_BRIDGE_IP", &self.hue_bridge_ip),
        ];
        for (field, value) in hosts {
            if value.trim().is_empty() {
                errors.push(ValidationError::EmptyField(field));
            } else if let Err(reason) = check_host(value) {
                errors.push(ValidationError::InvalidHost { field, reason });
            }
        }

        let required = [
            ("PLEX_TOKEN", &self.plex_token),
            ("HUE_USERNAME", &self.hue_username),
            ("HUE_LIGHT_ID", &self.hue_light_id),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                errors.push(ValidationError::EmptyField(field));
            }
        }

        let interval_ok = Duration::try_from_secs_f64(self.poll_interval_seconds)
            .is_ok_and(|d| !d.is_zero());
        if !interval_ok {
            errors.push(ValidationError::InvalidPollInterval(self.poll_interval_seconds));
        }
        if self.status_timeout_seconds == 0 {
            errors.push(ValidationError::ZeroTimeout("STATUS_TIMEOUT_SECONDS"));
        }
        if self.light_timeout_seconds == 0 {
            errors.push(ValidationError::ZeroTimeout("LIGHT_TIMEOUT_SECONDS"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Hosts are interpolated into URLs, so reject schemes, paths and spaces.
fn check_host(value: &str) -> std::result::Result<(), String> {
    if value.contains("://") {
        return Err(format!("expected a host, not a URL: \"{value}\""));
    }
    if value.contains('/') || value.chars().any(char::is_whitespace) {
        return Err(format!("\"{value}\" is not a host name or address"));
    }
    Ok(())
}
