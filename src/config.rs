use std::{
    fmt::Display,
    net::{IpAddr, SocketAddr},
    str::FromStr,
};

use thiserror::Error;

use crate::domain::models::credential::HashParams;

/// Shortest salt Argon2 accepts
const MIN_SALT_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub max_body_size: usize,
    pub compression_level: i32,
    pub log_level: String,
    pub db_max_connections: u32,
    pub max_concurrent_hashes: usize,
    pub hash_params: HashParams,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl Config {
    /// Read configuration from the process environment, after `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let host = parse_or(&lookup, "IDENTITY_HOST", IpAddr::from([0, 0, 0, 0]))?;
        let port = parse_or(&lookup, "IDENTITY_PORT", 8080)?;
        let max_body_size = parse_or(&lookup, "IDENTITY_MAX_BODY_SIZE", 1024 * 1024)?;
        let compression_level = parse_or(&lookup, "IDENTITY_COMPRESSION_LEVEL", 5)?;
        let log_level = lookup("IDENTITY_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let db_max_connections = parse_or(&lookup, "IDENTITY_DB_MAX_CONNECTIONS", 10)?;

        let default_hashes = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        let max_concurrent_hashes =
            parse_or(&lookup, "IDENTITY_MAX_CONCURRENT_HASHES", default_hashes)?;
        if max_concurrent_hashes == 0 {
            return Err(ConfigError::Invalid {
                key: "IDENTITY_MAX_CONCURRENT_HASHES",
                reason: "must be at least 1".to_string(),
            });
        }

        let hash_params = HashParams {
            memory_kib: parse_or(
                &lookup,
                "IDENTITY_ARGON2_MEMORY_KIB",
                HashParams::DEFAULT_MEMORY_KIB,
            )?,
            time_cost: parse_or(
                &lookup,
                "IDENTITY_ARGON2_TIME_COST",
                HashParams::DEFAULT_TIME_COST,
            )?,
            parallelism: parse_or(
                &lookup,
                "IDENTITY_ARGON2_PARALLELISM",
                HashParams::DEFAULT_PARALLELISM,
            )?,
            key_len: parse_or(&lookup, "IDENTITY_ARGON2_KEY_LEN", HashParams::DEFAULT_KEY_LEN)?,
            salt_len: parse_or(
                &lookup,
                "IDENTITY_ARGON2_SALT_LEN",
                HashParams::DEFAULT_SALT_LEN,
            )?,
        };
        validate_hash_params(&hash_params)?;

        Ok(Config {
            database_url,
            host,
            port,
            max_body_size,
            compression_level,
            log_level,
            db_max_connections,
            max_concurrent_hashes,
            hash_params,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Reject settings Argon2 would refuse on the first sign-up.
fn validate_hash_params(params: &HashParams) -> Result<(), ConfigError> {
    if params.salt_len < MIN_SALT_LEN {
        return Err(ConfigError::Invalid {
            key: "IDENTITY_ARGON2_SALT_LEN",
            reason: format!("must be at least {MIN_SALT_LEN} bytes"),
        });
    }
    argon2::Params::new(
        params.memory_kib,
        params.time_cost,
        u32::from(params.parallelism),
        Some(params.key_len),
    )
    .map_err(|e| ConfigError::Invalid {
        key: "IDENTITY_ARGON2_*",
        reason: e.to_string(),
    })?;
    Ok(())
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rstest::rstest;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/identity")]).unwrap();

        assert_eq!(config.addr(), "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.max_body_size, 1024 * 1024);
        assert_eq!(config.compression_level, 5);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.hash_params, HashParams::default());
        assert!(config.max_concurrent_hashes >= 1);
    }

    #[test]
    fn database_url_is_required() {
        assert!(matches!(load(&[]), Err(ConfigError::Missing("DATABASE_URL"))));
    }

    #[test]
    fn overrides_hash_params() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/identity"),
            ("IDENTITY_ARGON2_MEMORY_KIB", "65536"),
            ("IDENTITY_ARGON2_TIME_COST", "3"),
            ("IDENTITY_ARGON2_PARALLELISM", "4"),
            ("IDENTITY_MAX_CONCURRENT_HASHES", "2"),
        ])
        .unwrap();

        assert_eq!(config.hash_params.memory_kib, 65536);
        assert_eq!(config.hash_params.time_cost, 3);
        assert_eq!(config.hash_params.parallelism, 4);
        assert_eq!(config.max_concurrent_hashes, 2);
    }

    #[rstest]
    #[case("IDENTITY_PORT", "http")]
    #[case("IDENTITY_HOST", "localhost:80")]
    #[case("IDENTITY_ARGON2_PARALLELISM", "300")]
    #[case("IDENTITY_ARGON2_SALT_LEN", "4")]
    #[case("IDENTITY_ARGON2_TIME_COST", "0")]
    #[case("IDENTITY_ARGON2_MEMORY_KIB", "4")]
    #[case("IDENTITY_MAX_CONCURRENT_HASHES", "0")]
    fn rejects_invalid_values(#[case] key: &str, #[case] value: &str) {
        let result = load(&[("DATABASE_URL", "postgres://localhost/identity"), (key, value)]);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }
}
