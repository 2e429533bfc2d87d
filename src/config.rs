use std::time::Duration;

use anyhow::Context;

pub const API_URL_VAR: &str = "PLACEMENT_API_URL";
pub const API_TOKEN_VAR: &str = "PLACEMENT_API_TOKEN";
pub const API_TIMEOUT_VAR: &str = "PLACEMENT_API_TIMEOUT_SECS";
pub const LOG_VAR: &str = "PLACEMENT_LOG";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl ApiConfig {
    /// Reads the backend settings from the environment. `url_override` comes
    /// from the command line and wins over `PLACEMENT_API_URL`.
    pub fn from_env(url_override: Option<&str>) -> anyhow::Result<Self> {
        Self::from_lookup(url_override, |key| std::env::var(key).ok())
    }

    fn from_lookup(
        url_override: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let base_url = match url_override {
            Some(url) => url.to_string(),
            None => lookup(API_URL_VAR)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{API_URL_VAR} must be set to the placement backend URL"))?,
        };

        let timeout_secs = match lookup(API_TIMEOUT_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{API_TIMEOUT_VAR} must be a whole number of seconds"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(ApiConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: lookup(API_TOKEN_VAR).filter(|t| !t.trim().is_empty()),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Installs the stderr log subscriber. `PLACEMENT_LOG` takes precedence over
/// `RUST_LOG`; the default level is `info`.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_VAR)
        .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
