use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let database_url = require("DATABASE_URL")?;
    let jwt_secret = require("NEARBUY_JWT_SECRET")?;
    if jwt_secret.trim().is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "NEARBUY_JWT_SECRET".to_string(),
            reason: "must not be empty".to_string(),
        });
    }

    let env = parse_environment(&or_default("NEARBUY_ENV", "development"));

    let bind_addr = parse_var(
        &or_default("NEARBUY_BIND_ADDR", "0.0.0.0:5000"),
        "NEARBUY_BIND_ADDR",
    )?;
    let log_level = or_default("NEARBUY_LOG_LEVEL", "info");
    let catalog_path = PathBuf::from(or_default(
        "NEARBUY_CATALOG_PATH",
        "./config/catalog.yaml",
    ));

    let jwt_ttl_secs = parse_var(
        &or_default("NEARBUY_JWT_TTL_SECS", "604800"),
        "NEARBUY_JWT_TTL_SECS",
    )?;
    let db_max_connections = parse_var(
        &or_default("NEARBUY_DB_MAX_CONNECTIONS", "10"),
        "NEARBUY_DB_MAX_CONNECTIONS",
    )?;
    let db_min_connections = parse_var(
        &or_default("NEARBUY_DB_MIN_CONNECTIONS", "1"),
        "NEARBUY_DB_MIN_CONNECTIONS",
    )?;
    let db_acquire_timeout_secs = parse_var(
        &or_default("NEARBUY_DB_ACQUIRE_TIMEOUT_SECS", "10"),
        "NEARBUY_DB_ACQUIRE_TIMEOUT_SECS",
    )?;
    let rate_limit_per_minute = parse_var(
        &or_default("NEARBUY_RATE_LIMIT_PER_MINUTE", "120"),
        "NEARBUY_RATE_LIMIT_PER_MINUTE",
    )?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        catalog_path,
        jwt_secret,
        jwt_ttl_secs,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        rate_limit_per_minute,
    })
}

fn parse_var<T>(raw: &str, var: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: e.to_string(),
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
