//! Unified error type for the plexhue-lib crate.
//!
//! [`PlexhueError`] wraps module-specific errors (`BridgeError`, `ServerError`)
//! plus configuration and I/O failures. `From` impls allow `?` to propagate
//! across module boundaries.

use std::fmt;

use crate::bridge::BridgeError;
use crate::server::ServerError;

/// Unified error type for plexhue-lib operations.
#[derive(Debug)]
pub enum PlexhueError {
    /// Hue bridge communication error.
    Bridge(BridgeError),
    /// Plex status probe error.
    Server(ServerError),
    /// Standard I/O error (config persistence).
    Io(std::io::Error),
    /// Configuration load or validation error.
    Config(String),
}

impl fmt::Display for PlexhueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlexhueError::Bridge(e) => write!(f, "{e}"),
            PlexhueError::Server(e) => write!(f, "{e}"),
            PlexhueError::Io(e) => write!(f, "I/O error: {e}"),
            PlexhueError::Config(e) => write!(f, "Config error: {e}"),
        }
    }
}

impl std::error::Error for PlexhueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlexhueError::Bridge(e) => Some(e),
            PlexhueError::Server(e) => Some(e),
            PlexhueError::Io(e) => Some(e),
            PlexhueError::Config(_) => None,
        }
    }
}

impl From<BridgeError> for PlexhueError {
    fn from(e: BridgeError) -> Self {
        PlexhueError::Bridge(e)
    }
}

impl From<ServerError> for PlexhueError {
    fn from(e: ServerError) -> Self {
        PlexhueError::Server(e)
    }
}

impl From<std::io::Error> for PlexhueError {
    fn from(e: std::io::Error) -> Self {
        PlexhueError::Io(e)
    }
}

/// Crate-level Result alias using [`PlexhueError`].
pub type Result<T> = std::result::Result<T, PlexhueError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bridge_error() {
        let e: PlexhueError = BridgeError::Status(404).into();
        assert!(matches!(e, PlexhueError::Bridge(BridgeError::Status(404))));
    }

    #[test]
    fn from_server_error() {
        let e: PlexhueError = ServerError::Status(401).into();
        assert!(matches!(e, PlexhueError::Server(ServerError::Status(401))));
    }

    #[test]
    fn display_bridge_error() {
        let e = PlexhueError::Bridge(BridgeError::Api("unauthorized user".into()));
        assert_eq!(e.to_string(), "Hue bridge error: unauthorized user");
    }

    #[test]
    fn display_config_error() {
        let e = PlexhueError::Config("missing field `PLEX_TOKEN`".into());
        assert_eq!(e.to_string(), "Config error: missing field `PLEX_TOKEN`");
    }

    #[test]
    fn source_chains_server_error() {
        let e = PlexhueError::Server(ServerError::Network("timed out".into()));
        let source = std::error::Error::source(&e).unwrap();
        assert!(source.to_string().contains("timed out"));
    }

    #[test]
    fn source_none_for_config() {
        let e = PlexhueError::Config("x".into());
        assert!(std::error::Error::source(&e).is_none());
    }

    #[test]
    fn question_mark_propagation_bridge_to_plexhue() {
        fn inner() -> crate::bridge::Result<()> {
            Err(BridgeError::Malformed("GET light: missing `state`".into()))
        }
        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }
        let err = outer().unwrap_err();
        assert!(matches!(err, PlexhueError::Bridge(BridgeError::Malformed(_))));
    }

    #[test]
    fn question_mark_propagation_io_to_plexhue() {
        fn inner() -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "nope"))
        }
        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }
        assert!(matches!(outer().unwrap_err(), PlexhueError::Io(_)));
    }
}
