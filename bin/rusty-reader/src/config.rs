//! Runtime configuration, read from the environment after `.env` is loaded.

use anyhow::Context;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:rusty_reader.db";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub port: u16,
    pub db_max_connections: u32,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unset variables fall back to defaults; malformed numbers are errors.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw.parse().with_context(|| format!("PORT is not a valid port: {raw:?}"))?,
            None => DEFAULT_PORT,
        };
        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("DB_MAX_CONNECTIONS is not a number: {raw:?}"))?,
            None => DEFAULT_DB_MAX_CONNECTIONS,
        };
        if db_max_connections == 0 {
            anyhow::bail!("DB_MAX_CONNECTIONS must be at least 1");
        }

        Ok(AppConfig {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            port,
            db_max_connections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.bind_addr, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.db_max_connections, 5);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[("PORT", "9090"), ("DATABASE_URL", "sqlite::memory:"), ("DB_MAX_CONNECTIONS", "1")]).unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.db_max_connections, 1);
    }

    #[test]
    fn test_malformed_numbers_are_rejected() {
        assert!(load(&[("PORT", "eighty")]).is_err());
        assert!(load(&[("DB_MAX_CONNECTIONS", "0")]).is_err());
    }
}
