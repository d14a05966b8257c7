/// Credentials stored as a JSON secret in AWS Secrets Manager
///
/// The secret's `SecretString` must be a JSON object carrying the connection
/// parameters. Two key conventions are accepted:
///
/// ```json
/// { "DB_NAME": "users", "DB_USER": "app", "DB_PASSWORD": "...",
///   "DB_HOST": "db.internal:5432", "DB_PORT": "5432" }
/// ```
///
/// or the layout RDS writes for managed secrets:
///
/// ```json
/// { "dbname": "users", "username": "app", "password": "...",
///   "host": "db.internal", "port": 5432, "engine": "postgres" }
/// ```
///
/// The port may be a number or a numeric string and defaults to 5432. Any
/// `:port` suffix on the host is stripped; the port field wins.

use super::{normalize_host, parse_port, CredentialError, DbCredentials, DEFAULT_DB_PORT};
use async_trait::async_trait;
use aws_sdk_secretsmanager::{error::DisplayErrorContext, Client};
use serde::Deserialize;
use tracing::{debug, error};

/// Default AWS region when `AWS_REGION` is unset
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Where to find the secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretsManagerConfig {
    /// Secret name or ARN (`DB_SECRET_NAME`)
    pub secret_name: String,

    /// AWS region (`AWS_REGION`)
    pub region: String,

    /// Custom endpoint, e.g. a local emulator (`AWS_ENDPOINT_URL`)
    pub endpoint_url: Option<String>,
}

impl SecretsManagerConfig {
    /// Creates a config for the given secret in the default region
    pub fn new(secret_name: impl Into<String>) -> Self {
        Self {
            secret_name: secret_name.into(),
            region: DEFAULT_AWS_REGION.to_string(),
            endpoint_url: None,
        }
    }
}

/// A store that can return a secret's string payload by name
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetches the secret's string value
    ///
    /// Returns `Ok(None)` when the secret exists but has no string payload
    /// (for example a binary-only secret).
    async fn get_secret_string(&self, secret_name: &str) -> Result<Option<String>, CredentialError>;
}

/// [`SecretStore`] backed by the AWS SDK
#[derive(Debug, Clone)]
pub struct AwsSecretsManager {
    client: Client,
}

impl AwsSecretsManager {
    /// Loads the default AWS credential chain for the configured region
    pub async fn new(config: &SecretsManagerConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        Self {
            client: Client::new(&sdk_config),
        }
    }
}

#[async_trait]
impl SecretStore for AwsSecretsManager {
    async fn get_secret_string(&self, secret_name: &str) -> Result<Option<String>, CredentialError> {
        debug!(secret_name, "Fetching secret from Secrets Manager");

        let output = self
            .client
            .get_secret_value()
            .secret_id(secret_name)
            .send()
            .await
            .map_err(|err| CredentialError::Retrieval {
                secret_name: secret_name.to_string(),
                message: DisplayErrorContext(&err).to_string(),
            })?;

        Ok(output.secret_string().map(str::to_string))
    }
}

/// Fetches and parses credentials from a secret store
pub async fn resolve_from_store<S>(store: &S, secret_name: &str) -> Result<DbCredentials, CredentialError>
where
    S: SecretStore + ?Sized,
{
    let payload = match store.get_secret_string(secret_name).await {
        Ok(Some(payload)) => payload,
        Ok(None) => {
            return Err(CredentialError::SecretFormat {
                secret_name: secret_name.to_string(),
                reason: "secret has no string value".to_string(),
            })
        }
        Err(err) => {
            error!(secret_name, error = %err, "Unable to retrieve database credentials");
            return Err(err);
        }
    };

    parse_secret(secret_name, &payload)
}

/// Parses a secret's JSON payload into credentials
pub fn parse_secret(secret_name: &str, payload: &str) -> Result<DbCredentials, CredentialError> {
    let format_error = |reason: String| CredentialError::SecretFormat {
        secret_name: secret_name.to_string(),
        reason,
    };

    let secret: SecretPayload =
        serde_json::from_str(payload).map_err(|err| format_error(err.to_string()))?;

    let port = match secret.port {
        None => DEFAULT_DB_PORT,
        Some(PortValue::Number(n)) => u16::try_from(n)
            .ok()
            .filter(|port| *port != 0)
            .ok_or_else(|| format_error(format!("port {} is out of range", n)))?,
        Some(PortValue::Text(text)) => {
            parse_port(&text).map_err(|err| format_error(err.to_string()))?
        }
    };

    Ok(DbCredentials {
        database: secret.database,
        user: secret.user,
        password: secret.password,
        host: normalize_host(&secret.host),
        port,
    })
}

#[derive(Deserialize)]
struct SecretPayload {
    #[serde(rename = "DB_NAME", alias = "dbname")]
    database: String,

    #[serde(rename = "DB_USER", alias = "username")]
    user: String,

    #[serde(rename = "DB_PASSWORD", alias = "password")]
    password: String,

    #[serde(rename = "DB_HOST", alias = "host")]
    host: String,

    #[serde(rename = "DB_PORT", alias = "port", default)]
    port: Option<PortValue>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u64),
    Text(String),
}
