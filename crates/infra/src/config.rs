//! Configuration loading and representation.
//!
//! All settings come from environment variables; every variable has a
//! default except `DATABASE_URL`, whose absence selects the in-memory store.

use std::net::SocketAddr;

use thiserror::Error;

pub const BIND_ADDR_VAR: &str = "PETCLINIC_BIND_ADDR";
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const SEED_DATA_VAR: &str = "PETCLINIC_SEED_DATA";
pub const DB_MAX_CONNECTIONS_VAR: &str = "PETCLINIC_DB_MAX_CONNECTIONS";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Which storage backend the application runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    InMemory,
    Postgres {
        url: String,
        max_connections: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub storage: StorageConfig,
    /// Load the demo dataset into an empty store on startup.
    pub seed_demo_data: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_raw = lookup(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            var: BIND_ADDR_VAR,
            value: bind_raw.clone(),
            reason: e.to_string(),
        })?;

        let seed_demo_data = match lookup(SEED_DATA_VAR) {
            None => true,
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::Invalid {
                var: SEED_DATA_VAR,
                value: raw.clone(),
                reason: "expected true/false".to_string(),
            })?,
        };

        let storage = match lookup(DATABASE_URL_VAR).filter(|url| !url.trim().is_empty()) {
            None => StorageConfig::InMemory,
            Some(url) => {
                let max_connections = match lookup(DB_MAX_CONNECTIONS_VAR) {
                    None => DEFAULT_DB_MAX_CONNECTIONS,
                    Some(raw) => raw
                        .trim()
                        .parse::<u32>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| ConfigError::Invalid {
                            var: DB_MAX_CONNECTIONS_VAR,
                            value: raw.clone(),
                            reason: "expected a positive integer".to_string(),
                        })?,
                };
                StorageConfig::Postgres {
                    url,
                    max_connections,
                }
            }
        };

        Ok(Self {
            bind_addr,
            storage,
            seed_demo_data,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
