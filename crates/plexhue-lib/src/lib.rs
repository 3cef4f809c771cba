//! plexhue — turn a Hue light red while Plex Media Server is offline.

pub mod bridge;
pub mod clock;
pub mod config;
pub mod error;
pub mod hooks;
pub mod light;
pub mod monitor;
pub mod server;

#[cfg(test)]
mod test_http;

pub use error::PlexhueError;
