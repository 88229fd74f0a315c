// File: painel-core/src/config.rs
//
// Console configuration. Everything the console needs to reach the outside
// world is passed in here at construction time.

use std::time::Duration;

use tracing::warn;
use url::Url;

use crate::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:3055";
pub const DEFAULT_SOCKET_URL: &str = "http://localhost:3055/atendimento";
pub const DEFAULT_CAPTION: &str = "Arquivo enviado pelo atendente";

/// Backoff used by the realtime client after a transport failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub enabled: bool,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl ReconnectPolicy {
    pub fn disabled() -> Self {
        Self { enabled: false, ..Self::default() }
    }

    /// Delay before reconnect attempt number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub api_base_url: Url,
    pub socket_url: Url,
    /// HS256 secret for the signed session token.
    pub session_secret: String,
    pub session_max_age: chrono::Duration,
    pub queue_refresh_interval: Duration,
    pub error_notice_ttl: Duration,
    pub success_notice_ttl: Duration,
    /// Delay between the end-of-session notice and the transcript teardown.
    pub session_close_delay: Duration,
    pub handshake_timeout: Duration,
    pub reconnect: ReconnectPolicy,
    pub default_caption: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: Url::parse(DEFAULT_API_URL).expect("static url"),
            socket_url: Url::parse(DEFAULT_SOCKET_URL).expect("static url"),
            session_secret: String::new(),
            session_max_age: chrono::Duration::days(30),
            queue_refresh_interval: Duration::from_secs(5),
            error_notice_ttl: Duration::from_secs(5),
            success_notice_ttl: Duration::from_secs(3),
            session_close_delay: Duration::from_secs(1),
            handshake_timeout: Duration::from_secs(10),
            reconnect: ReconnectPolicy::default(),
            default_caption: DEFAULT_CAPTION.to_string(),
        }
    }
}

impl ConsoleConfig {
    /// Reads `PAINEL_*` variables (after loading a `.env` file if present)
    /// on top of the defaults.
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("PAINEL_API_URL") {
            cfg.api_base_url = Url::parse(&v)?;
        }
        if let Ok(v) = std::env::var("PAINEL_SOCKET_URL") {
            cfg.socket_url = Url::parse(&v)?;
        }
        if let Ok(v) = std::env::var("PAINEL_SESSION_SECRET") {
            cfg.session_secret = v;
        }
        if let Ok(v) = std::env::var("PAINEL_QUEUE_REFRESH_SECS") {
            let secs: u64 = v
                .parse()
                .map_err(|_| Error::Parse(format!("PAINEL_QUEUE_REFRESH_SECS: '{}'", v)))?;
            cfg.queue_refresh_interval = Duration::from_secs(secs.max(1));
        }
        if let Ok(v) = std::env::var("PAINEL_RECONNECT") {
            cfg.reconnect.enabled = !matches!(v.to_lowercase().as_str(), "0" | "false" | "off");
        }

        if cfg.session_secret.is_empty() {
            warn!("PAINEL_SESSION_SECRET not set; session tokens are signed with an empty secret");
        }
        Ok(cfg)
    }

    /// Joins `path` onto the API base url, keeping any base path prefix.
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        let p = ReconnectPolicy::default();
        assert_eq!(p.delay_for(0), Duration::from_secs(1));
        assert_eq!(p.delay_for(1), Duration::from_secs(2));
        assert_eq!(p.delay_for(2), Duration::from_secs(4));
        assert_eq!(p.delay_for(3), Duration::from_secs(5));
        assert_eq!(p.delay_for(40), Duration::from_secs(5));
    }

    #[test]
    fn api_url_joins_without_double_slashes() {
        let mut cfg = ConsoleConfig::default();
        assert_eq!(cfg.api_url("/auth/login"), "http://localhost:3055/auth/login");
        cfg.api_base_url = Url::parse("http://api.local/v1/").unwrap();
        assert_eq!(cfg.api_url("atendentes/me"), "http://api.local/v1/atendentes/me");
    }
}
