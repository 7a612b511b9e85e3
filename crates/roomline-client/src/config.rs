//! Client configuration loaded from environment variables.
//!
//! All settings have defaults so the client can start with zero
//! configuration against a local development server.

use std::path::PathBuf;
use std::time::Duration;

use roomline_shared::constants::{
    DEFAULT_NEAR_BOTTOM_THRESHOLD, DEFAULT_POLL_INTERVAL_MS, DEFAULT_SERVER_URL,
};

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the room server.
    /// Env: `ROOMLINE_SERVER_URL`
    /// Default: `http://127.0.0.1:3000`
    pub server_url: String,

    /// Delay between two room state fetches.
    /// Env: `ROOMLINE_POLL_INTERVAL_MS`
    /// Default: 1600 ms
    pub poll_interval: Duration,

    /// Distance from the bottom under which the timeline stays anchored.
    /// Env: `ROOMLINE_SCROLL_THRESHOLD`
    /// Default: `84.0`
    pub near_bottom_threshold: f64,

    /// Directory holding the token database. `None` selects the platform
    /// data directory.
    /// Env: `ROOMLINE_DATA_DIR`
    pub data_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            near_bottom_threshold: DEFAULT_NEAR_BOTTOM_THRESHOLD,
            data_dir: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("ROOMLINE_SERVER_URL") {
            let url = url.trim().trim_end_matches('/');
            if url.starts_with("http://") || url.starts_with("https://") {
                config.server_url = url.to_string();
            } else {
                tracing::warn!(value = %url, "Invalid ROOMLINE_SERVER_URL, using default");
            }
        }

        if let Some(val) = lookup("ROOMLINE_POLL_INTERVAL_MS") {
            match val.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config.poll_interval = Duration::from_millis(ms),
                _ => {
                    tracing::warn!(value = %val, "Invalid ROOMLINE_POLL_INTERVAL_MS, using default")
                }
            }
        }

        if let Some(val) = lookup("ROOMLINE_SCROLL_THRESHOLD") {
            match val.trim().parse::<f64>() {
                Ok(t) if t.is_finite() && t >= 0.0 => config.near_bottom_threshold = t,
                _ => {
                    tracing::warn!(value = %val, "Invalid ROOMLINE_SCROLL_THRESHOLD, using default")
                }
            }
        }

        if let Some(dir) = lookup("ROOMLINE_DATA_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = Some(PathBuf::from(dir));
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}
