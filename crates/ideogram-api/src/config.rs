use std::env;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.ideogram.ai";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const USER_AGENT: &str = concat!("ideogram-character/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`crate::IdeogramClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with `IDEOGRAM_API_BASE` applied when it is set and non-empty.
    pub fn from_env() -> Self {
        let config = Self::default();
        match env::var("IDEOGRAM_API_BASE") {
            Ok(raw) => config.with_api_base(raw),
            Err(_) => config,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        if let Some(base) = normalize_api_base(&api_base.into()) {
            self.api_base = base;
        }
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }
}

fn normalize_api_base(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

pub(crate) fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
