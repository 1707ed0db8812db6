//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;

use scrapyard_observability::LogFormat;
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is invalid: {message}")]
    Invalid { var: &'static str, message: String },
}

impl ConfigError {
    fn invalid(var: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// `None` runs on the in-memory store.
    pub database: Option<DatabaseConfig>,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("BIND_ADDR", e.to_string()))?;

        let log_format = match get("LOG_FORMAT") {
            Some(v) => v
                .parse::<LogFormat>()
                .map_err(|e| ConfigError::invalid("LOG_FORMAT", e.to_string()))?,
            None => LogFormat::default(),
        };

        let database = match get("DATABASE_URL") {
            None => None,
            Some(url) => {
                let max_connections = match get("DATABASE_MAX_CONNECTIONS") {
                    Some(v) => v
                        .trim()
                        .parse::<u32>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| {
                            ConfigError::invalid(
                                "DATABASE_MAX_CONNECTIONS",
                                format!("expected a positive integer, got {v:?}"),
                            )
                        })?,
                    None => DEFAULT_MAX_CONNECTIONS,
                };
                let run_migrations = match get("RUN_MIGRATIONS") {
                    Some(v) => parse_bool(&v).ok_or_else(|| {
                        ConfigError::invalid(
                            "RUN_MIGRATIONS",
                            format!("expected true or false, got {v:?}"),
                        )
                    })?,
                    None => true,
                };
                Some(DatabaseConfig {
                    url,
                    max_connections,
                    run_migrations,
                })
            }
        };

        Ok(Self {
            bind_addr,
            database,
            log_format,
        })
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_to_in_memory_json_on_8080() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(cfg.database, None);
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn database_settings_follow_url() {
        let cfg = config(&[
            ("DATABASE_URL", "postgres://localhost/scrap"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("RUN_MIGRATIONS", "false"),
        ])
        .unwrap();
        assert_eq!(
            cfg.database,
            Some(DatabaseConfig {
                url: "postgres://localhost/scrap".to_string(),
                max_connections: 4,
                run_migrations: false,
            })
        );
    }

    #[test]
    fn invalid_values_are_errors_not_defaults() {
        assert!(matches!(
            config(&[("BIND_ADDR", "localhost")]),
            Err(ConfigError::Invalid { var: "BIND_ADDR", .. })
        ));
        assert!(matches!(
            config(&[("LOG_FORMAT", "xml")]),
            Err(ConfigError::Invalid { var: "LOG_FORMAT", .. })
        ));
        assert!(matches!(
            config(&[("DATABASE_URL", "postgres://x"), ("DATABASE_MAX_CONNECTIONS", "0")]),
            Err(ConfigError::Invalid { var: "DATABASE_MAX_CONNECTIONS", .. })
        ));
        assert!(matches!(
            config(&[("DATABASE_URL", "postgres://x"), ("RUN_MIGRATIONS", "maybe")]),
            Err(ConfigError::Invalid { var: "RUN_MIGRATIONS", .. })
        ));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let cfg = config(&[("DATABASE_URL", "  "), ("LOG_FORMAT", "")]).unwrap();
        assert_eq!(cfg.database, None);
        assert_eq!(cfg.log_format, LogFormat::Json);
    }
}
