/// Database credential resolution
///
/// This module produces the five connection parameters the service needs
/// (`database`, `user`, `password`, `host`, `port`) from one of two sources:
///
/// - `env`: static environment variables (`DB_NAME`, `DB_USER`, ...)
/// - `secrets_manager`: a JSON secret stored in AWS Secrets Manager
///
/// Both paths yield the same [`DbCredentials`] value, which is then handed to
/// [`crate::db::pool::connect`].
///
/// # Example
///
/// ```no_run
/// use userhub_shared::credentials::{resolve, CredentialSource};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let credentials = resolve(&CredentialSource::Environment).await?;
/// println!("Connecting to {}:{}", credentials.host, credentials.port);
/// # Ok(())
/// # }
/// ```

pub mod env;
pub mod secrets_manager;

use std::fmt;
use thiserror::Error;
use tracing::info;

pub use secrets_manager::{AwsSecretsManager, SecretStore, SecretsManagerConfig};

/// Default PostgreSQL port, used when no port is configured
pub const DEFAULT_DB_PORT: u16 = 5432;

/// Credential resolution errors
#[derive(Error, Debug)]
pub enum CredentialError {
    /// A required environment variable is not set
    #[error("{0} environment variable is required")]
    MissingVariable(&'static str),

    /// The configured port is not a valid TCP port
    #[error("invalid database port {value:?}")]
    InvalidPort { value: String },

    /// The secrets store could not be reached or refused the request
    #[error("unable to retrieve secret {secret_name:?}: {message}")]
    Retrieval {
        secret_name: String,
        message: String,
    },

    /// The secret exists but its payload is missing or malformed
    #[error("secret {secret_name:?} is not in the expected format: {reason}")]
    SecretFormat {
        secret_name: String,
        reason: String,
    },
}

/// Connection parameters for the relational database
///
/// `Debug` never prints the password.
#[derive(Clone, PartialEq, Eq)]
pub struct DbCredentials {
    /// Database name
    pub database: String,

    /// Login role
    pub user: String,

    /// Login password
    pub password: String,

    /// Hostname or IP address, without any port suffix
    pub host: String,

    /// TCP port
    pub port: u16,
}

impl fmt::Debug for DbCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbCredentials")
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

/// Where credentials come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// `DB_NAME`, `DB_USER`, `DB_PASSWORD`, `DB_HOST`, `DB_PORT`
    Environment,

    /// A JSON secret in AWS Secrets Manager
    SecretsManager(SecretsManagerConfig),
}

impl CredentialSource {
    /// Short label used in logs
    pub fn label(&self) -> &'static str {
        match self {
            CredentialSource::Environment => "env",
            CredentialSource::SecretsManager(_) => "secrets-manager",
        }
    }
}

/// Resolves credentials from the configured source
///
/// # Errors
///
/// - [`CredentialError::MissingVariable`] / [`CredentialError::InvalidPort`]
///   for bad environment configuration
/// - [`CredentialError::Retrieval`] if Secrets Manager cannot be reached
/// - [`CredentialError::SecretFormat`] if the secret payload is malformed
pub async fn resolve(source: &CredentialSource) -> Result<DbCredentials, CredentialError> {
    info!(source = source.label(), "Resolving database credentials");

    let credentials = match source {
        CredentialSource::Environment => env::from_env()?,
        CredentialSource::SecretsManager(config) => {
            let store = AwsSecretsManager::new(config).await;
            secrets_manager::resolve_from_store(&store, &config.secret_name).await?
        }
    };

    info!(
        database = %credentials.database,
        user = %credentials.user,
        host = %credentials.host,
        port = credentials.port,
        "Database credentials resolved"
    );

    Ok(credentials)
}

/// Parses a port given as text
pub(crate) fn parse_port(value: &str) -> Result<u16, CredentialError> {
    value
        .trim()
        .parse::<u16>()
        .ok()
        .filter(|port| *port != 0)
        .ok_or_else(|| CredentialError::InvalidPort {
            value: value.to_string(),
        })
}

/// Strips a `:port` suffix from a host value
///
/// Accepts `db.example.com:5432` and `[::1]:5432`. A bare IPv6 address such as
/// `::1` contains colons but no port and is returned unchanged.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();

    if let Some(rest) = host.strip_prefix('[') {
        if let Some((address, _)) = rest.split_once(']') {
            return address.to_string();
        }
        return host.to_string();
    }

    match host.rsplit_once(':') {
        Some((name, port))
            if !name.is_empty()
                && !name.contains(':')
                && !port.is_empty()
                && port.chars().all(|c| c.is_ascii_digit()) =>
        {
            name.to_string()
        }
        _ => host.to_string(),
    }
}
