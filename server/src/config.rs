//! Server configuration.

use std::time::Duration;

/// Main server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub listen_addr: String,
    /// Listen port.
    pub listen_port: u16,
    /// Upstream rate provider endpoint.
    pub upstream_url: String,
    /// Reference currency the upstream quotes against.
    pub reference_currency: String,
    /// Timeout for a single upstream request.
    pub upstream_timeout: Duration,
    /// Interval between background snapshot refreshes; `None` disables
    /// them and the snapshot only ages until restart.
    pub refresh_interval: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            listen_port: 9000,
            upstream_url: "https://api.fixer.io".to_string(),
            reference_currency: "USD".to_string(),
            upstream_timeout: Duration::from_secs(10),
            refresh_interval: Some(Duration::from_secs(4 * 60 * 60)),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("RATES_LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Ok(port) = std::env::var("RATES_LISTEN_PORT") {
            if let Ok(port) = port.parse() {
                config.listen_port = port;
            }
        }

        if let Ok(url) = std::env::var("RATES_UPSTREAM_URL") {
            config.upstream_url = url;
        }

        if let Ok(code) = std::env::var("RATES_REFERENCE_CURRENCY") {
            config.reference_currency = code;
        }

        if let Ok(secs) = std::env::var("RATES_UPSTREAM_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.upstream_timeout = Duration::from_secs(secs);
            }
        }

        if let Ok(secs) = std::env::var("RATES_REFRESH_INTERVAL_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                config.refresh_interval = if secs == 0 {
                    None
                } else {
                    Some(Duration::from_secs(secs))
                };
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_port == 0 {
            return Err("Listen port cannot be 0".to_string());
        }

        if self.upstream_url.is_empty() {
            return Err("Upstream URL cannot be empty".to_string());
        }

        if self.reference_currency.len() != 3
            || !self
                .reference_currency
                .chars()
                .all(|c| c.is_ascii_alphabetic())
        {
            return Err("Reference currency must be a 3-letter code".to_string());
        }

        if self.upstream_timeout.is_zero() {
            return Err("Upstream timeout cannot be 0".to_string());
        }

        Ok(())
    }
}
