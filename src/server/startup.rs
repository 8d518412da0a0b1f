use sea_orm::DatabaseConnection;
use std::time::Duration as StdDuration;
use time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing::warn;

use crate::server::{config::Config, error::AppError};

/// Connects to the Sqlite database and runs pending migrations.
///
/// Establishes a connection pool to the Sqlite database using the connection string from
/// configuration, then automatically runs all pending SeaORM migrations to ensure the database
/// schema is up-to-date. This function must complete successfully before the application can
/// access the database.
///
/// # Arguments
/// - `config` - Application configuration containing the database URL
///
/// # Returns
/// - `Ok(DatabaseConnection)` - Connected database with migrations applied
/// - `Err(Error)` - Failed to connect to database or run migrations
pub async fn connect_to_database(config: &Config) -> Result<DatabaseConnection, AppError> {
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectOptions, Database};

    let mut opt = ConnectOptions::new(&config.database_url);
    opt.sqlx_logging(false);

    let db = Database::connect(opt).await?;

    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Creates the session layer backed by the application database.
///
/// The session table is created in the same Sqlite pool as the configuration rows.
/// Sessions expire after seven days of inactivity.
///
/// # Arguments
/// - `db` - Connected database
///
/// # Returns
/// - `Ok(SessionManagerLayer)` - Session layer ready to wrap the router
/// - `Err(AppError::DbErr(_))` - Failed to create the session table
pub async fn connect_to_session(
    db: &DatabaseConnection,
) -> Result<SessionManagerLayer<SqliteStore>, AppError> {
    let pool = db.get_sqlite_connection_pool();
    let session_store = SqliteStore::new(pool.clone());

    session_store
        .migrate()
        .await
        .map_err(|e| sea_orm::DbErr::Custom(e.to_string()))?;

    let session = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(Duration::days(7)));

    Ok(session)
}

/// Builds the shared outbound HTTP client.
///
/// Redirects are not followed, so an upstream cannot bounce calls to other hosts.
pub fn setup_reqwest_client() -> Result<reqwest::Client, AppError> {
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(StdDuration::from_secs(10))
        .build()?;

    Ok(client)
}

/// Returns the startup signing keys.
///
/// Without configured keys a random key is generated, which invalidates every issued
/// tracking cookie on restart.
pub fn setup_signed_keys(config: &Config) -> Vec<String> {
    if !config.signed_keys.is_empty() {
        return config.signed_keys.clone();
    }

    warn!("SIGNED_KEYS is not set, generating a random signing key");
    vec![hex::encode(rand::random::<[u8; 32]>())]
}
