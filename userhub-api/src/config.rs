/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct. Database credentials themselves are not
/// read here: the config only records *where* they come from, and
/// [`userhub_shared::credentials::resolve`] fetches them during startup.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `PORT`: Port to bind to (default: 3000)
/// - `DB_CREDENTIALS_SOURCE`: `env` or `secrets-manager` (default: `secrets-manager`
///   if `DB_SECRET_NAME` is set, otherwise `env`)
/// - `DB_SECRET_NAME`: Secrets Manager secret holding the credentials
/// - `AWS_REGION`: Region of the secret (default: us-east-1)
/// - `AWS_ENDPOINT_URL`: Custom Secrets Manager endpoint (optional)
/// - `DB_CONNECT_POLICY`: `lazy` or `fail-fast` (default: lazy)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `DATABASE_ACQUIRE_TIMEOUT_SECS`: Pool acquire timeout (default: 30)
///
/// # Example
///
/// ```no_run
/// use userhub_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::fmt::Display;
use std::str::FromStr;
use userhub_shared::credentials::secrets_manager::DEFAULT_AWS_REGION;
use userhub_shared::credentials::{CredentialSource, SecretsManagerConfig};
use userhub_shared::db::pool::{ConnectPolicy, DatabaseConfig};

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseSettings,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    /// Where connection credentials are resolved from
    pub credentials: CredentialSource,

    /// Pool sizing, timeouts and connect policy
    pub pool: DatabaseConfig,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// `main` loads `.env` before this runs, so its values are visible here.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable has an invalid value, or if the
    /// Secrets Manager source is selected without `DB_SECRET_NAME`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "PORT", 3000u16)?;

        let secret_name = lookup("DB_SECRET_NAME");
        let use_secrets_manager = match lookup("DB_CREDENTIALS_SOURCE") {
            Some(source) => match source.trim().to_ascii_lowercase().as_str() {
                "env" => false,
                "secrets-manager" | "secretsmanager" | "aws" => true,
                other => anyhow::bail!(
                    "DB_CREDENTIALS_SOURCE must be \"env\" or \"secrets-manager\", got {:?}",
                    other
                ),
            },
            None => secret_name.is_some(),
        };

        let credentials = if use_secrets_manager {
            let secret_name = secret_name.ok_or_else(|| {
                anyhow::anyhow!("DB_SECRET_NAME environment variable is required")
            })?;

            CredentialSource::SecretsManager(SecretsManagerConfig {
                secret_name,
                region: lookup("AWS_REGION").unwrap_or_else(|| DEFAULT_AWS_REGION.to_string()),
                endpoint_url: lookup("AWS_ENDPOINT_URL"),
            })
        } else {
            CredentialSource::Environment
        };

        let defaults = DatabaseConfig::default();
        let pool = DatabaseConfig {
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", defaults.max_connections)?,
            acquire_timeout_seconds: parse_or(
                &lookup,
                "DATABASE_ACQUIRE_TIMEOUT_SECS",
                defaults.acquire_timeout_seconds,
            )?,
            startup_check_timeout_seconds: parse_or(
                &lookup,
                "DATABASE_STARTUP_CHECK_TIMEOUT_SECS",
                defaults.startup_check_timeout_seconds,
            )?,
            policy: parse_or(&lookup, "DB_CONNECT_POLICY", ConnectPolicy::default())?,
            ..defaults
        };

        if pool.max_connections == 0 {
            anyhow::bail!("DATABASE_MAX_CONNECTIONS must be at least 1");
        }

        Ok(Self {
            api: ApiConfig { host, port },
            database: DatabaseSettings { credentials, pool },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid value {:?} for {}: {}", value, key, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.api.port, 3000);
        assert_eq!(config.database.credentials, CredentialSource::Environment);
        assert_eq!(config.database.pool.max_connections, 10);
        assert_eq!(config.database.pool.policy, ConnectPolicy::Lazy);
    }

    #[test]
    fn test_bind_address() {
        let config = config_from(&[("API_HOST", "127.0.0.1"), ("PORT", "8080")]).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_secret_name_selects_secrets_manager() {
        let config = config_from(&[("DB_SECRET_NAME", "prod/users-db")]).unwrap();

        match config.database.credentials {
            CredentialSource::SecretsManager(sm) => {
                assert_eq!(sm.secret_name, "prod/users-db");
                assert_eq!(sm.region, "us-east-1");
                assert!(sm.endpoint_url.is_none());
            }
            other => panic!("unexpected source: {:?}", other),
        }
    }

    #[test]
    fn test_secrets_manager_region_and_endpoint() {
        let config = config_from(&[
            ("DB_SECRET_NAME", "prod/users-db"),
            ("AWS_REGION", "eu-west-1"),
            ("AWS_ENDPOINT_URL", "http://localhost:4566"),
        ])
        .unwrap();

        let CredentialSource::SecretsManager(sm) = config.database.credentials else {
            panic!("expected secrets manager source");
        };
        assert_eq!(sm.region, "eu-west-1");
        assert_eq!(sm.endpoint_url.as_deref(), Some("http://localhost:4566"));
    }

    #[test]
    fn test_explicit_env_source_ignores_secret_name() {
        let config = config_from(&[
            ("DB_CREDENTIALS_SOURCE", "env"),
            ("DB_SECRET_NAME", "prod/users-db"),
        ])
        .unwrap();
        assert_eq!(config.database.credentials, CredentialSource::Environment);
    }

    #[test]
    fn test_secrets_manager_requires_secret_name() {
        let err = config_from(&[("DB_CREDENTIALS_SOURCE", "secrets-manager")]).unwrap_err();
        assert!(err.to_string().contains("DB_SECRET_NAME"));
    }

    #[test]
    fn test_unknown_source_rejected() {
        assert!(config_from(&[("DB_CREDENTIALS_SOURCE", "vault")]).is_err());
    }

    #[test]
    fn test_connect_policy_and_pool_settings() {
        let config = config_from(&[
            ("DB_CONNECT_POLICY", "fail-fast"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("DATABASE_ACQUIRE_TIMEOUT_SECS", "5"),
            ("DATABASE_STARTUP_CHECK_TIMEOUT_SECS", "2"),
        ])
        .unwrap();

        assert_eq!(config.database.pool.policy, ConnectPolicy::FailFast);
        assert_eq!(config.database.pool.max_connections, 4);
        assert_eq!(config.database.pool.acquire_timeout_seconds, 5);
        assert_eq!(config.database.pool.startup_check_timeout_seconds, 2);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = config_from(&[("PORT", "http")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));

        assert!(config_from(&[("DB_CONNECT_POLICY", "eventually")]).is_err());
        assert!(config_from(&[("DATABASE_MAX_CONNECTIONS", "0")]).is_err());
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = config_from(&[("PORT", ""), ("DB_SECRET_NAME", "  ")]).unwrap();
        assert_eq!(config.api.port, 3000);
        assert_eq!(config.database.credentials, CredentialSource::Environment);
    }
}
