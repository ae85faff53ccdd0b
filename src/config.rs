//! Router configuration
//!
//! Loaded from the environment (call `dotenv` first in binaries).

use crate::dialog::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::error::RouterError;
use crate::fallback::search::{DUCKDUCKGO, KNOWN_PROVIDERS, WIKIPEDIA};
use crate::fallback::DEFAULT_PROVIDER_TIMEOUT;
use crate::Result;
use std::env;
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = "conversational-query-router/0.1";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Minimum confidence for a direct action
    pub confidence_threshold: f32,
    /// Per-provider timeout for external search
    pub search_timeout: Duration,
    /// Ordered search provider names; empty disables external search
    pub search_providers: Vec<String>,
    pub search_user_agent: String,
    pub api_port: u16,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            search_timeout: DEFAULT_PROVIDER_TIMEOUT,
            search_providers: vec![DUCKDUCKGO.to_string(), WIKIPEDIA.to_string()],
            search_user_agent: DEFAULT_USER_AGENT.to_string(),
            api_port: DEFAULT_PORT,
        }
    }
}

impl RouterConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; missing keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("ROUTER_CONFIDENCE_THRESHOLD") {
            config.confidence_threshold = raw.trim().parse().map_err(|_| {
                RouterError::ConfigError(format!("ROUTER_CONFIDENCE_THRESHOLD is not a number: {}", raw))
            })?;
        }

        if let Some(raw) = lookup("SEARCH_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                RouterError::ConfigError(format!("SEARCH_TIMEOUT_SECS is not an integer: {}", raw))
            })?;
            config.search_timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup("SEARCH_PROVIDERS") {
            config.search_providers = raw
                .split(',')
                .map(|name| name.trim().to_lowercase())
                .filter(|name| !name.is_empty())
                .collect();
        }

        if let Some(agent) = lookup("SEARCH_USER_AGENT").filter(|a| !a.trim().is_empty()) {
            config.search_user_agent = agent;
        }

        if let Some(raw) = lookup("PORT").or_else(|| lookup("API_PORT")) {
            config.api_port = raw.trim().parse().map_err(|_| {
                RouterError::ConfigError(format!("PORT is not a valid port: {}", raw))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(RouterError::ConfigError(format!(
                "confidence threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }

        if self.search_timeout.is_zero() {
            return Err(RouterError::ConfigError(
                "search timeout must be greater than zero".to_string(),
            ));
        }

        if let Some(unknown) = self
            .search_providers
            .iter()
            .find(|name| !KNOWN_PROVIDERS.contains(&name.as_str()))
        {
            return Err(RouterError::ConfigError(format!(
                "unknown search provider: {} (known: {})",
                unknown,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio_test::{assert_err, assert_ok};

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<RouterConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RouterConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = assert_ok!(from_pairs(&[]));
        assert_eq!(config.confidence_threshold, 0.5);
        assert_eq!(config.search_timeout, Duration::from_secs(5));
        assert_eq!(config.search_providers, vec!["duckduckgo", "wikipedia"]);
        assert_eq!(config.api_port, 8080);
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("ROUTER_CONFIDENCE_THRESHOLD", "0.7"),
            ("SEARCH_TIMEOUT_SECS", "2"),
            ("SEARCH_PROVIDERS", " Wikipedia , "),
            ("API_PORT", "9000"),
        ])
        .unwrap();

        assert_eq!(config.confidence_threshold, 0.7);
        assert_eq!(config.search_timeout, Duration::from_secs(2));
        assert_eq!(config.search_providers, vec!["wikipedia"]);
        assert_eq!(config.api_port, 9000);
    }

    #[test]
    fn test_empty_provider_list_disables_search() {
        let config = from_pairs(&[("SEARCH_PROVIDERS", "")]).unwrap();
        assert!(config.search_providers.is_empty());
    }

    #[test]
    fn test_invalid_values() {
        assert_err!(from_pairs(&[("ROUTER_CONFIDENCE_THRESHOLD", "1.5")]));
        assert_err!(from_pairs(&[("ROUTER_CONFIDENCE_THRESHOLD", "high")]));
        assert_err!(from_pairs(&[("SEARCH_TIMEOUT_SECS", "0")]));
        assert_err!(from_pairs(&[("SEARCH_PROVIDERS", "duckduckgo,bing")]));
        assert_err!(from_pairs(&[("PORT", "99999")]));
    }
}
