//! Centralized configuration (environment variables + defaults).
//!
//! Binaries call `dotenv::dotenv().ok()` before reading anything here, so a local
//! `.env` file works the same as exported variables.

use anyhow::{anyhow, Context};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_CATALOG_URL: &str = "https://books.toscrape.com/";

/// Reads `key` and parses it, falling back to `default` when unset or blank.
fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("{} has an invalid value '{}': {}", key, v, e)),
        _ => Ok(default),
    }
}

/// Database URL must be provided (no default) when the postgres backend is used.
pub fn database_url() -> anyhow::Result<String> {
    std::env::var("DATABASE_URL").context("DATABASE_URL must be set")
}

/// Postgres pool size.
pub fn db_max_connections() -> anyhow::Result<u32> {
    Ok(env_or("DB_MAX_CONNECTIONS", 5u32)?.max(1))
}

/// Which `BookStore` implementation the binaries construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(StoreBackend::Postgres),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => Err(format!("expected 'postgres' or 'memory', got '{}'", other)),
        }
    }
}

pub fn store_backend() -> anyhow::Result<StoreBackend> {
    env_or("STORE_BACKEND", StoreBackend::Postgres)
}

/// Scrape target. Only overridden for tests and mirrors.
pub fn catalog_url() -> String {
    std::env::var("CATALOG_URL")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string())
}

pub fn fetch_timeout() -> anyhow::Result<Duration> {
    Ok(Duration::from_secs(env_or("FETCH_TIMEOUT_SECS", 10u64)?.max(1)))
}

pub fn bind_addr() -> String {
    std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string())
}

pub fn run_etl_on_startup() -> anyhow::Result<bool> {
    env_or("RUN_ETL_ON_STARTUP", true)
}

/// Recurring pipeline interval. `None` (unset or 0) means run once at startup only.
pub fn etl_interval() -> anyhow::Result<Option<Duration>> {
    let secs: u64 = env_or("ETL_INTERVAL_SECS", 0)?;
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}

pub fn write_retries() -> anyhow::Result<u32> {
    env_or("ETL_WRITE_RETRIES", 0u32)
}

pub fn retry_backoff() -> anyhow::Result<Duration> {
    Ok(Duration::from_millis(env_or("ETL_RETRY_BACKOFF_MS", 500u64)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_store_backend_names() {
        assert_eq!("Postgres".parse::<StoreBackend>(), Ok(StoreBackend::Postgres));
        assert_eq!("memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("mongo".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn malformed_value_is_an_error_not_the_default() {
        // Keys unique to this test; other tests read the real variable names.
        std::env::set_var("BOOKS_ETL_TEST_TIMEOUT_SECS", "abc");
        let err = env_or("BOOKS_ETL_TEST_TIMEOUT_SECS", 10u64).unwrap_err();
        assert!(err.to_string().contains("BOOKS_ETL_TEST_TIMEOUT_SECS has an invalid value 'abc'"));

        std::env::set_var("BOOKS_ETL_TEST_BACKEND", "mongo");
        assert!(env_or("BOOKS_ETL_TEST_BACKEND", StoreBackend::Memory).is_err());
    }

    #[test]
    fn unset_or_blank_value_falls_back_to_default() {
        std::env::remove_var("BOOKS_ETL_TEST_UNSET_SECS");
        assert_eq!(env_or("BOOKS_ETL_TEST_UNSET_SECS", 10u64).unwrap(), 10);

        std::env::set_var("BOOKS_ETL_TEST_BLANK_SECS", "  ");
        assert_eq!(env_or("BOOKS_ETL_TEST_BLANK_SECS", 7u64).unwrap(), 7);
    }
}
