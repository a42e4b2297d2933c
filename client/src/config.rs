use crate::{ClientError, Result};
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Hosted Trex API
pub const BASE_URL: &str = "https://api.automorphic.ai/trex";

/// Environment variable read when no API key is passed explicitly
pub const API_KEY_ENV: &str = "TREX_API_KEY";

/// Client settings
///
/// Deserializable so it can sit inside a caller's own configuration file:
///
/// ```toml
/// [trex]
/// base_url = "http://localhost:8080/trex"
/// timeout_secs = 30
/// ```
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Explicit API key, takes precedence over `api_key_env`
    pub api_key: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub base_url: String,
    /// Whole request timeout. `None` keeps the transport default
    #[serde(rename = "timeout_secs", deserialize_with = "deserialize_secs")]
    pub timeout: Option<Duration>,
    pub user_agent: String,
    /// Compile regex patterns before sending them
    pub check_patterns_locally: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: API_KEY_ENV.to_string(),
            base_url: BASE_URL.to_string(),
            timeout: None,
            user_agent: concat!("trex-client/", env!("CARGO_PKG_VERSION")).to_string(),
            check_patterns_locally: false,
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_key_env", &self.api_key_env)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("check_patterns_locally", &self.check_patterns_locally)
            .finish()
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_api_key_env(mut self, var: impl Into<String>) -> Self {
        self.api_key_env = var.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_local_pattern_check(mut self, enabled: bool) -> Self {
        self.check_patterns_locally = enabled;
        self
    }

    /// Resolve the API key: the explicit key if non empty, else the environment variable
    pub(crate) fn resolve_api_key(&self) -> Result<String> {
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| {
                std::env::var(&self.api_key_env)
                    .ok()
                    .filter(|key| !key.is_empty())
            })
            .ok_or_else(|| ClientError::MissingApiKey {
                var: self.api_key_env.clone(),
            })
    }
}

fn deserialize_secs<'de, D>(deserializer: D) -> std::result::Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
}
