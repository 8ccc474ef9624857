use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

use crate::error::ConfigError;
use crate::routes::cookies::CookieSettings;
use crate::switches::validate_switch_name;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Postgres connection string; switches are kept in memory without one.
    pub database_url: Option<String>,
    /// Switch names known to the application, created on startup if missing.
    pub switches: Vec<String>,
    pub sticky_max_age_secs: Option<u64>,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv().is_ok();

        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Reads every setting through `lookup`, which returns the raw value of
    /// a variable or `None` when it is unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let port = non_empty("PORT")
            .ok_or(ConfigError::Missing("PORT"))?
            .trim()
            .parse::<u16>()
            .map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                var: "PORT",
                value: lookup("PORT").unwrap_or_default(),
                reason: format!("must be a valid u16 number ({e})"),
            })?;

        let host = non_empty("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let switches = match non_empty("FEATURE_SWITCHES") {
            Some(raw) => parse_switch_names(&raw)?,
            None => Vec::new(),
        };

        let sticky_max_age_secs = match non_empty("STICKY_MAX_AGE_SECS") {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    var: "STICKY_MAX_AGE_SECS",
                    value: raw.clone(),
                    reason: format!("must be a whole number of seconds ({e})"),
                }
            })?),
            None => None,
        };

        Ok(Self {
            host,
            port,
            database_url: non_empty("DATABASE_URL"),
            switches,
            sticky_max_age_secs,
            log_level: non_empty("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn cookie_settings(&self) -> CookieSettings {
        CookieSettings {
            max_age_secs: self.sticky_max_age_secs,
        }
    }
}

fn parse_switch_names(raw: &str) -> Result<Vec<String>, ConfigError> {
    let mut names: Vec<String> = Vec::new();

    for name in raw.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        validate_switch_name(name).map_err(|reason| ConfigError::Invalid {
            var: "FEATURE_SWITCHES",
            value: name.to_string(),
            reason,
        })?;
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("PORT", "8080")]).unwrap();

        assert_eq!(config.addr(), "127.0.0.1:8080");
        assert!(config.database_url.is_none());
        assert!(config.switches.is_empty());
        assert_eq!(config.sticky_max_age_secs, None);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_all_settings() {
        let config = load(&[
            ("PORT", "3000"),
            ("HOST", "0.0.0.0"),
            ("DATABASE_URL", "postgres://localhost/switches"),
            ("FEATURE_SWITCHES", " new-search, checkout ,,new-search"),
            ("STICKY_MAX_AGE_SECS", "2592000"),
            ("LOG_LEVEL", "debug"),
        ])
        .unwrap();

        assert_eq!(config.addr(), "0.0.0.0:3000");
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/switches")
        );
        assert_eq!(config.switches, vec!["new-search", "checkout"]);
        assert_eq!(config.cookie_settings().max_age_secs, Some(2_592_000));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_missing_port() {
        assert!(matches!(load(&[]), Err(ConfigError::Missing("PORT"))));
        assert!(matches!(
            load(&[("PORT", " ")]),
            Err(ConfigError::Missing("PORT"))
        ));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("PORT", "70000")]),
            Err(ConfigError::Invalid { var: "PORT", .. })
        ));
        assert!(matches!(
            load(&[("PORT", "80"), ("STICKY_MAX_AGE_SECS", "-1")]),
            Err(ConfigError::Invalid { var: "STICKY_MAX_AGE_SECS", .. })
        ));
        assert!(matches!(
            load(&[("PORT", "80"), ("FEATURE_SWITCHES", "ok,not ok")]),
            Err(ConfigError::Invalid { var: "FEATURE_SWITCHES", .. })
        ));
    }
}
