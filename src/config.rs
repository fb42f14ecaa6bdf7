use std::time::Duration;

use reqwest::Url;

pub const URL_ENV: &str = "SUPABASE_URL";
pub const ANON_KEY_ENV: &str = "SUPABASE_ANON_KEY";

pub const DEFAULT_CHANNEL: &str = "chat-room-1";
pub const DEFAULT_TABLE: &str = "messages";
pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_HEARTBEAT_SECS: u64 = 25;
pub const DEFAULT_JOIN_TIMEOUT_SECS: u64 = 10;

const REALTIME_PATH: &str = "realtime/v1/websocket";
const REALTIME_VSN: &str = "1.0.0";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing backend URL; pass --url or set {URL_ENV}")]
    MissingUrl,
    #[error("missing backend key; pass --anon-key or set {ANON_KEY_ENV}")]
    MissingAnonKey,
    #[error("invalid backend URL `{0}`")]
    InvalidUrl(String),
}

/// The two secrets needed to reach the hosted backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    url: Url,
    anon_key: String,
}

impl BackendConfig {
    /// Validate raw values. Both are required; blank counts as missing.
    pub fn new(url: Option<String>, anon_key: Option<String>) -> Result<Self, ConfigError> {
        let url = url
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingUrl)?;
        let anon_key = anon_key
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingAnonKey)?;

        let mut parsed = Url::parse(&url).map_err(|_| ConfigError::InvalidUrl(url.clone()))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl(url));
        }
        // Keep a trailing slash so `join` appends instead of replacing the last segment.
        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }

        Ok(Self {
            url: parsed,
            anon_key,
        })
    }

    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    /// `{base}/rest/v1/{table}`
    pub fn table_url(&self, table: &str) -> Result<Url, ConfigError> {
        self.url
            .join(&format!("rest/v1/{table}"))
            .map_err(|_| ConfigError::InvalidUrl(self.url.to_string()))
    }

    /// `ws(s)://{host}/realtime/v1/websocket?apikey=..&vsn=1.0.0`
    pub fn realtime_url(&self) -> Result<Url, ConfigError> {
        let invalid = || ConfigError::InvalidUrl(self.url.to_string());

        let mut url = self.url.join(REALTIME_PATH).map_err(|_| invalid())?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme).map_err(|_| invalid())?;
        url.query_pairs_mut()
            .clear()
            .append_pair("apikey", &self.anon_key)
            .append_pair("vsn", REALTIME_VSN);
        Ok(url)
    }
}

/// Which channel to join and which table to watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSettings {
    pub channel: String,
    pub schema: String,
    pub table: String,
    pub heartbeat: Duration,
    /// Upper bound on connecting and sending the join.
    pub join_timeout: Duration,
}

impl ChannelSettings {
    pub fn topic(&self) -> String {
        format!("realtime:{}", self.channel)
    }
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            channel: DEFAULT_CHANNEL.to_string(),
            schema: DEFAULT_SCHEMA.to_string(),
            table: DEFAULT_TABLE.to_string(),
            heartbeat: Duration::from_secs(DEFAULT_HEARTBEAT_SECS),
            join_timeout: Duration::from_secs(DEFAULT_JOIN_TIMEOUT_SECS),
        }
    }
}
