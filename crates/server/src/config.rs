use std::time::Duration;

const DEFAULT_USER_AGENT: &str = concat!("showscout/", env!("CARGO_PKG_VERSION"));

/// Process configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub db_path: String,
    pub bind_addr: String,
    /// Wall-clock budget for one source during a search.
    pub source_timeout: Duration,
    /// Timeout for a single HTTP request made by a source.
    pub fetch_timeout: Duration,
    pub user_agent: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: "showscout.db".to_string(),
            bind_addr: "0.0.0.0:8097".to_string(),
            source_timeout: Duration::from_secs(15),
            fetch_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let secs = |key: &str, fallback: Duration| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|&s| s > 0)
                .map(Duration::from_secs)
                .unwrap_or(fallback)
        };

        Self {
            db_path: lookup("SHOWSCOUT_DB").unwrap_or(defaults.db_path),
            bind_addr: lookup("SHOWSCOUT_BIND").unwrap_or(defaults.bind_addr),
            source_timeout: secs("SHOWSCOUT_SOURCE_TIMEOUT_SECS", defaults.source_timeout),
            fetch_timeout: secs("SHOWSCOUT_FETCH_TIMEOUT_SECS", defaults.fetch_timeout),
            user_agent: lookup("SHOWSCOUT_USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }
}
