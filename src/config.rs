use std::str::FromStr;
use std::time::Duration;

use crate::marvel_client::DEFAULT_BASE_URL;

#[derive(Debug)]
pub struct Config {
    pub public_key: String,
    pub private_key: String,
    pub base_url: String,
    pub db_connection_string: String,
    pub request_timeout: Duration,
    pub detail_delay: Duration,
}

const DEFAULT_DB_CONNECTION_STRING: &str = "sqlite://favorites.sqlite?mode=rwc";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
const DEFAULT_DETAIL_DELAY_MS: u64 = 1000;

impl Config {
    pub fn load() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; `load` uses the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let public_key = lookup("MARVEL_PUBLIC_KEY").unwrap_or_default();
        let private_key = lookup("MARVEL_PRIVATE_KEY").unwrap_or_default();
        let base_url = lookup("MARVEL_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(DEFAULT_BASE_URL.into());
        let db_connection_string =
            lookup("DB_CONNECTION_STRING").unwrap_or(DEFAULT_DB_CONNECTION_STRING.into());
        let request_timeout = Duration::from_secs(parse_or(
            &lookup,
            "REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        ));
        let detail_delay =
            Duration::from_millis(parse_or(&lookup, "DETAIL_DELAY_MS", DEFAULT_DETAIL_DELAY_MS));
        Config {
            public_key,
            private_key,
            base_url,
            db_connection_string,
            request_timeout,
            detail_delay,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.public_key.is_empty() {
            return Err("MARVEL_PUBLIC_KEY is missing".into());
        }
        if self.private_key.is_empty() {
            return Err("MARVEL_PRIVATE_KEY is missing".into());
        }
        Ok(())
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T {
    match lookup(name) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(%name, value = %raw, "invalid value, using default");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let c = config(&[]);
        assert_eq!(c.base_url, DEFAULT_BASE_URL);
        assert_eq!(c.db_connection_string, DEFAULT_DB_CONNECTION_STRING);
        assert_eq!(c.request_timeout, Duration::from_secs(15));
        assert_eq!(c.detail_delay, Duration::from_secs(1));
        assert_eq!(c.validate().unwrap_err(), "MARVEL_PUBLIC_KEY is missing");
    }

    #[test]
    fn values_are_read_and_bad_numbers_fall_back() {
        let c = config(&[
            ("MARVEL_PUBLIC_KEY", "pub"),
            ("MARVEL_PRIVATE_KEY", "priv"),
            ("REQUEST_TIMEOUT_SECS", "3"),
            ("DETAIL_DELAY_MS", "soon"),
        ]);
        assert!(c.validate().is_ok());
        assert_eq!(c.request_timeout, Duration::from_secs(3));
        assert_eq!(c.detail_delay, Duration::from_secs(1));
    }

    #[test]
    fn missing_private_key_is_reported() {
        let c = config(&[("MARVEL_PUBLIC_KEY", "pub")]);
        assert_eq!(c.validate().unwrap_err(), "MARVEL_PRIVATE_KEY is missing");
    }
}
