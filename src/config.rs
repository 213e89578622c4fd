use std::env;
use std::time::Duration;
use thiserror::Error;

use crate::api::Scope;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// backend base url, e.g. `https://api.example.edu`
    pub api_url: String,
    pub api_token: Option<String>,
    /// question collection that CRUD calls go to
    pub scope: Scope,
    pub timeout: Duration,
}

impl Config {
    /// Reads `QBANK_*` variables, loading a `.env` file first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_url = get("QBANK_API_URL").ok_or(ConfigError::Missing("QBANK_API_URL"))?;
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                name: "QBANK_API_URL",
                value: api_url,
            });
        }

        let scope = match get("QBANK_SCOPE") {
            Some(value) => value.parse::<Scope>().map_err(|_| ConfigError::Invalid {
                name: "QBANK_SCOPE",
                value,
            })?,
            None => Scope::default(),
        };

        let timeout = match get("QBANK_TIMEOUT_SECS") {
            Some(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "QBANK_TIMEOUT_SECS",
                        value,
                    })
                }
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_url,
            api_token: get("QBANK_API_TOKEN"),
            scope,
            timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&[("QBANK_API_URL", "https://api.example.edu")])).unwrap();
        assert_eq!(config.scope, Scope::College);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.api_token, None);
    }

    #[test]
    fn url_is_required() {
        assert_eq!(
            Config::from_lookup(lookup(&[("QBANK_API_TOKEN", "t")])).unwrap_err(),
            ConfigError::Missing("QBANK_API_URL")
        );
    }

    #[test]
    fn bad_values_are_reported() {
        let err = Config::from_lookup(lookup(&[
            ("QBANK_API_URL", "https://api.example.edu"),
            ("QBANK_SCOPE", "school"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "QBANK_SCOPE",
                value: "school".into()
            }
        );

        let err = Config::from_lookup(lookup(&[
            ("QBANK_API_URL", "https://api.example.edu"),
            ("QBANK_TIMEOUT_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "QBANK_TIMEOUT_SECS", .. }));
    }

    #[test]
    fn course_scope_and_token() {
        let config = Config::from_lookup(lookup(&[
            ("QBANK_API_URL", "http://localhost:8000"),
            ("QBANK_SCOPE", "course"),
            ("QBANK_API_TOKEN", " secret "),
        ]))
        .unwrap();
        assert_eq!(config.scope, Scope::Course);
        assert_eq!(config.api_token.as_deref(), Some("secret"));
    }
}
