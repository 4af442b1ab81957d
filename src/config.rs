//! Process configuration — command-line flags with environment fallbacks.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

pub const DEFAULT_PORT: u16 = 4050;
pub const DEFAULT_BROADCAST_INTERVAL_MS: u64 = 10;

#[derive(Parser, Debug, Clone)]
#[command(name = "cursorboard", about = "Share live pointer positions over websockets")]
pub struct Config {
    /// Address to listen on.
    #[arg(long, env = "LISTEN_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// The server port.
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Directory holding the browser front end.
    #[arg(long, env = "STATIC_DIR", default_value = "web/static")]
    pub static_dir: PathBuf,

    /// Milliseconds between broadcasts on `/wstime`.
    #[arg(
        long,
        env = "BROADCAST_INTERVAL_MS",
        default_value_t = DEFAULT_BROADCAST_INTERVAL_MS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub broadcast_interval_ms: u64,
}

impl Config {
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    #[must_use]
    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_millis(self.broadcast_interval_ms)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
