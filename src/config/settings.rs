//! Runtime settings read from the process environment.

use crate::error::ConfigError;
use std::net::SocketAddr;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/school";
const DEFAULT_SCHEMA: &str = "school";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_BODY_LIMIT: usize = 64 * 1024;

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    /// Schema holding the student, course and enrollment tables.
    pub schema: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    /// Insert the sample rows when the student table is empty.
    pub seed_data: bool,
    pub body_limit_bytes: usize,
}

impl Settings {
    /// Read settings from env. Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into());
        let schema = lookup("SCHOOL_SCHEMA").unwrap_or_else(|| DEFAULT_SCHEMA.into());
        if !is_identifier(&schema) {
            return Err(ConfigError::Invalid {
                name: "SCHOOL_SCHEMA",
                reason: format!("'{}' is not a plain identifier", schema),
            });
        }
        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.into())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: "BIND_ADDR",
                reason: e.to_string(),
            })?;
        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(v) => match v.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "DB_MAX_CONNECTIONS",
                        reason: format!("'{}' is not a positive integer", v),
                    })
                }
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };
        let seed_data = match lookup("SEED_DATA") {
            Some(v) => parse_flag(&v).ok_or_else(|| ConfigError::Invalid {
                name: "SEED_DATA",
                reason: format!("'{}' is not a boolean", v),
            })?,
            None => false,
        };
        let body_limit_bytes = match lookup("BODY_LIMIT_BYTES") {
            Some(v) => v.trim().parse::<usize>().map_err(|e| ConfigError::Invalid {
                name: "BODY_LIMIT_BYTES",
                reason: e.to_string(),
            })?,
            None => DEFAULT_BODY_LIMIT,
        };
        Ok(Settings {
            database_url,
            schema,
            bind_addr,
            max_connections,
            seed_data,
            body_limit_bytes,
        })
    }
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
