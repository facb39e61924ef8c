//! Configuration management for the trading tool.
//!
//! Credentials resolve from explicit overrides first, then from the
//! environment (with `.env` support). Resolution fails fast when either
//! credential is missing so no network call is ever attempted without them.

use std::env;
use std::fmt;

use crate::{Error, Result};

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Explicit values that take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub testnet: Option<bool>,
}

/// Resolved gateway settings. Validated once at startup and not mutated
/// afterward.
#[derive(Clone)]
pub struct Settings {
    pub api_key: String,
    pub api_secret: String,
    pub testnet: bool,
    /// Replaces the futures base endpoint entirely when set.
    pub base_url: Option<String>,
    /// Optional `recvWindow` (ms) attached to signed requests.
    pub recv_window: Option<u64>,
    pub request_timeout_secs: u64,
}

impl Settings {
    /// Load settings from overrides and the environment.
    ///
    /// Environment variables: `BINANCE_API_KEY`, `BINANCE_API_SECRET`,
    /// `BINANCE_TESTNET` (default true), `BINANCE_FUTURES_URL`,
    /// `BINANCE_RECV_WINDOW`.
    pub fn resolve(overrides: Overrides) -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = overrides
            .api_key
            .or_else(|| env::var("BINANCE_API_KEY").ok())
            .unwrap_or_default();
        let api_secret = overrides
            .api_secret
            .or_else(|| env::var("BINANCE_API_SECRET").ok())
            .unwrap_or_default();
        let testnet = overrides.testnet.unwrap_or_else(|| {
            env::var("BINANCE_TESTNET")
                .map(|v| !v.trim().eq_ignore_ascii_case("false"))
                .unwrap_or(true)
        });

        let mut settings = Self::from_parts(api_key, api_secret, testnet)?;
        settings.base_url = env::var("BINANCE_FUTURES_URL").ok().filter(|s| !s.is_empty());
        settings.recv_window = env::var("BINANCE_RECV_WINDOW")
            .ok()
            .and_then(|s| s.parse().ok());
        Ok(settings)
    }

    /// Validated constructor; rejects missing or empty credentials.
    pub fn from_parts(api_key: String, api_secret: String, testnet: bool) -> Result<Self> {
        if api_key.trim().is_empty() || api_secret.trim().is_empty() {
            return Err(Error::Config {
                message: "API key/secret are required. Set BINANCE_API_KEY and \
                          BINANCE_API_SECRET or pass --api-key/--api-secret."
                    .to_string(),
            });
        }

        Ok(Self {
            api_key,
            api_secret,
            testnet,
            base_url: None,
            recv_window: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        })
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .field("testnet", &self.testnet)
            .field("base_url", &self.base_url)
            .field("recv_window", &self.recv_window)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_requires_credentials() {
        assert!(Settings::from_parts(String::new(), "secret".into(), true).is_err());
        assert!(Settings::from_parts("key".into(), "  ".into(), true).is_err());

        let settings = Settings::from_parts("key".into(), "secret".into(), false).unwrap();
        assert!(!settings.testnet);
        assert_eq!(settings.request_timeout_secs, 10);
        assert!(settings.base_url.is_none());
    }

    #[test]
    fn test_debug_does_not_expose_credentials() {
        let settings =
            Settings::from_parts("live-key".into(), "live-secret".into(), true).unwrap();
        let debug_str = format!("{:?}", settings);
        assert!(!debug_str.contains("live-key"));
        assert!(!debug_str.contains("live-secret"));
        assert!(debug_str.contains("[REDACTED]"));
    }
}
