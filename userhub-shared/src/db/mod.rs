/// Database layer
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool construction and health checks
/// - `schema`: non-destructive schema synchronization (embedded migrations)
/// - Models are in the `models` module at crate root level
///
/// # Example
///
/// ```no_run
/// use userhub_shared::credentials::{resolve, CredentialSource};
/// use userhub_shared::db::{pool::{connect, DatabaseConfig}, schema::sync_schema};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let credentials = resolve(&CredentialSource::Environment).await?;
///     let pool = connect(&credentials, &DatabaseConfig::default()).await?;
///     sync_schema(&pool).await?;
///     Ok(())
/// }
/// ```

pub mod pool;
pub mod schema;
