//! Adapter configuration.
//!
//! Defaults cover the public Reya deployment. `from_env` layers `REYA_*`
//! variables (and a `.env` file, if present) on top.

use crate::domain::market::catalog::{CatalogEntry, DEFAULT_ENTRIES};
use crate::domain::market::SETTLEMENT_ASSET;
use crate::error::{AdapterError, AdapterResult};
use crate::retry::RetryConfig;
use crate::shared::AccountId;
use std::time::Duration;

pub const ENV_API_URL: &str = "REYA_API_URL";
pub const ENV_WS_URL: &str = "REYA_WS_URL";
pub const ENV_FALLBACK_URL: &str = "REYA_FALLBACK_URL";
pub const ENV_WALLET_ADDRESS: &str = "REYA_WALLET_ADDRESS";
pub const ENV_STALENESS_MS: &str = "REYA_STALENESS_MS";
pub const ENV_ORDER_TIMEOUT_MS: &str = "REYA_ORDER_TIMEOUT_MS";
/// Comma-separated asset list, e.g. `RUSD,SRUSD`.
pub const ENV_COLLATERAL: &str = "REYA_COLLATERAL";

#[derive(Debug, Clone)]
pub struct AdapterConfig {
    pub api_url: String,
    pub ws_url: String,
    pub fallback_url: String,
    /// Wallet used when an account operation is called without one.
    pub account: Option<AccountId>,
    /// Books older than this are `Stale`.
    pub staleness_window: Duration,
    /// Upper bound on a single signer call.
    pub order_timeout: Duration,
    pub market_cache_ttl: Duration,
    pub order_history_capacity: usize,
    /// Assets reported by `fetch_balance`; everything else is omitted.
    pub recognized_collateral: Vec<String>,
    pub catalog: Vec<CatalogEntry>,
    pub retry: RetryConfig,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            api_url: crate::network::DEFAULT_API_URL.to_string(),
            ws_url: crate::network::DEFAULT_WS_URL.to_string(),
            fallback_url: crate::network::DEFAULT_FALLBACK_URL.to_string(),
            account: None,
            staleness_window: Duration::from_secs(10),
            order_timeout: Duration::from_secs(30),
            market_cache_ttl: Duration::from_secs(60),
            order_history_capacity: 1024,
            recognized_collateral: vec![SETTLEMENT_ASSET.to_string()],
            catalog: DEFAULT_ENTRIES.clone(),
            retry: RetryConfig::default(),
        }
    }
}

impl AdapterConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> AdapterResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `REYA_*` key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AdapterResult<Self> {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_URL) {
            config.api_url = url;
        }
        if let Some(url) = get(ENV_WS_URL) {
            config.ws_url = url;
        }
        if let Some(url) = get(ENV_FALLBACK_URL) {
            config.fallback_url = url;
        }
        if let Some(address) = get(ENV_WALLET_ADDRESS) {
            config.account = Some(AccountId::new(address.trim()));
        }
        if let Some(ms) = get(ENV_STALENESS_MS) {
            config.staleness_window = parse_millis(ENV_STALENESS_MS, &ms)?;
        }
        if let Some(ms) = get(ENV_ORDER_TIMEOUT_MS) {
            config.order_timeout = parse_millis(ENV_ORDER_TIMEOUT_MS, &ms)?;
        }
        if let Some(assets) = get(ENV_COLLATERAL) {
            config.recognized_collateral = assets
                .split(',')
                .map(|a| a.trim().to_ascii_uppercase())
                .filter(|a| !a.is_empty())
                .collect();
        }
        Ok(config)
    }
}

fn parse_millis(key: &str, value: &str) -> AdapterResult<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| AdapterError::invalid(format!("{}={:?}: {}", key, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AdapterConfig::default();
        assert_eq!(config.recognized_collateral, vec!["RUSD".to_string()]);
        assert_eq!(config.catalog.len(), 2);
        assert!(config.account.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = AdapterConfig::from_lookup(lookup(&[
            (ENV_WALLET_ADDRESS, "0xabc"),
            (ENV_STALENESS_MS, "2500"),
            (ENV_COLLATERAL, "rusd, srusd,"),
            (ENV_API_URL, ""),
        ]))
        .unwrap();
        assert_eq!(config.account, Some(AccountId::from("0xabc")));
        assert_eq!(config.staleness_window, Duration::from_millis(2500));
        assert_eq!(config.recognized_collateral, vec!["RUSD", "SRUSD"]);
        assert_eq!(config.api_url, crate::network::DEFAULT_API_URL);
    }

    #[test]
    fn test_bad_duration_is_invalid() {
        let err = AdapterConfig::from_lookup(lookup(&[(ENV_ORDER_TIMEOUT_MS, "soon")])).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidRequest);
    }
}
