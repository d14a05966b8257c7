/// Static credentials from environment variables
///
/// # Environment Variables
///
/// - `DB_NAME`: database name (required)
/// - `DB_USER`: login role (required)
/// - `DB_PASSWORD`: login password (required, may be empty)
/// - `DB_HOST`: hostname (required)
/// - `DB_PORT`: port (default: 5432)

use super::{parse_port, CredentialError, DbCredentials, DEFAULT_DB_PORT};

/// Reads credentials from the process environment
pub fn from_env() -> Result<DbCredentials, CredentialError> {
    from_lookup(|key| std::env::var(key).ok())
}

/// Reads credentials through an arbitrary key lookup
///
/// `from_env` is this function over `std::env::var`; tests pass a map instead
/// of mutating the process environment.
pub fn from_lookup<F>(lookup: F) -> Result<DbCredentials, CredentialError>
where
    F: Fn(&str) -> Option<String>,
{
    let require = |key: &'static str| lookup(key).ok_or(CredentialError::MissingVariable(key));

    let database = require("DB_NAME")?;
    let user = require("DB_USER")?;
    let password = require("DB_PASSWORD")?;
    let host = require("DB_HOST")?;

    let port = match lookup("DB_PORT") {
        Some(value) if !value.trim().is_empty() => parse_port(&value)?,
        _ => DEFAULT_DB_PORT,
    };

    Ok(DbCredentials {
        database,
        user,
        password,
        host,
        port,
    })
}
