/// Database models
///
/// # Models
///
/// - `user`: the `User` resource and its CRUD operations
///
/// # Example
///
/// ```no_run
/// use userhub_shared::models::user::{CreateUser, User};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(
///     &pool,
///     CreateUser {
///         name: Some("Ada Lovelace".to_string()),
///         email: Some("ada@example.com".to_string()),
///     },
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```

pub mod user;
