use std::net::SocketAddr;
use std::time::Duration;

use envconfig::Envconfig;

use crate::algorithms::Algorithm;
use crate::error::{RatewallError, Result};
use crate::window::Window;

/// Process configuration, loaded from environment variables.
#[derive(Debug, Envconfig, Clone)]
pub struct Config {
    /// Server bind address
    #[envconfig(from = "BIND_ADDR", default = "127.0.0.1:4000")]
    pub bind_addr: SocketAddr,

    /// Redis connection URL
    #[envconfig(from = "REDIS_URL", default = "redis://127.0.0.1:6379")]
    pub redis_url: String,

    /// Decision algorithm
    #[envconfig(from = "RATEWALL_ALGORITHM", default = "sliding_window")]
    pub algorithm: Algorithm,

    /// Sliding window length in milliseconds
    #[envconfig(from = "RATE_LIMIT_WINDOW_MS", default = "2000")]
    pub window_ms: u64,

    /// Events allowed per window
    #[envconfig(from = "RATE_LIMIT_MAX_REQUESTS", default = "1")]
    pub max_requests: u32,

    /// Script registry reload cadence in seconds
    #[envconfig(from = "SCRIPT_RELOAD_INTERVAL_SECS", default = "1")]
    pub reload_interval_secs: u64,

    /// Name echoed by the demo endpoint
    #[envconfig(from = "SERVER_NAME", default = "ratewall")]
    pub server_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Config::init_from_hashmap(&std::collections::HashMap::new())
            .expect("static defaults parse")
    }
}

impl Config {
    /// Load configuration from environment variables. Invalid values are
    /// fatal at startup.
    pub fn from_env() -> Result<Self> {
        Config::init_from_env().map_err(|e| RatewallError::Config(e.to_string()))
    }

    /// The configured window length.
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// The configured window as the limiter's `Window` type.
    pub fn limit_window(&self) -> Window {
        Window::every(self.window())
    }

    /// The registry reload cadence.
    pub fn reload_interval(&self) -> Duration {
        Duration::from_secs(self.reload_interval_secs)
    }
}
