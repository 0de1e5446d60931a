use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::AppError;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1";
pub const DEFAULT_SESSION_FILE: &str = ".storefront-session.json";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL for auth and order endpoints.
    pub api_url: String,
    /// Base URL for product and category endpoints. Some deployments serve
    /// the catalog under a different prefix than orders.
    pub catalog_url: String,
    pub session_file: PathBuf,
    pub advisory_ttl: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            catalog_url: DEFAULT_API_URL.to_string(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            advisory_ttl: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();

        let api_url = lookup("STOREFRONT_API_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);
        let catalog_url = lookup("STOREFRONT_CATALOG_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| api_url.clone());
        let session_file = lookup("STOREFRONT_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.session_file);
        let advisory_ttl = match lookup("STOREFRONT_ADVISORY_SECS") {
            Some(raw) => Duration::from_secs(parse_secs("STOREFRONT_ADVISORY_SECS", &raw)?),
            None => defaults.advisory_ttl,
        };
        let request_timeout = match lookup("STOREFRONT_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_secs("STOREFRONT_TIMEOUT_SECS", &raw)?),
            None => defaults.request_timeout,
        };

        Ok(Self {
            api_url,
            catalog_url,
            session_file,
            advisory_ttl,
            request_timeout,
        })
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<u64, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{} must be a whole number of seconds", key)))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = ClientConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn catalog_url_follows_api_url() {
        let config = ClientConfig::from_lookup(lookup_from(&[(
            "STOREFRONT_API_URL",
            "https://shop.test/api/",
        )]))
        .unwrap();
        assert_eq!(config.api_url, "https://shop.test/api");
        assert_eq!(config.catalog_url, "https://shop.test/api");
    }

    #[test]
    fn catalog_url_can_differ() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("STOREFRONT_API_URL", "https://shop.test/api/v1"),
            ("STOREFRONT_CATALOG_URL", "https://catalog.test/api"),
        ]))
        .unwrap();
        assert_eq!(config.catalog_url, "https://catalog.test/api");
    }

    #[test]
    fn numeric_settings_are_parsed() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("STOREFRONT_ADVISORY_SECS", "4"),
            ("STOREFRONT_TIMEOUT_SECS", "10"),
        ]))
        .unwrap();
        assert_eq!(config.advisory_ttl, Duration::from_secs(4));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn invalid_number_is_a_config_error() {
        let err = ClientConfig::from_lookup(lookup_from(&[("STOREFRONT_ADVISORY_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
