//! Configuration factory for creating dynamic configuration rows.
//!
//! Rows default to enabled with a validity window spanning the current time, so they are
//! picked up by a refresh unless a test says otherwise.

use crate::factory::helpers::next_id;
use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, DbErr};

/// Status value of an enabled configuration row.
pub const STATUS_ENABLED: i32 = 1;
/// Status value of a disabled configuration row.
pub const STATUS_DISABLED: i32 = 2;

/// Factory for creating test configuration rows with customizable fields.
///
/// # Example
///
/// ```rust,ignore
/// use test_utils::factory::configuration::ConfigurationFactory;
///
/// let row = ConfigurationFactory::new(&db)
///     .category("routerConcurrency")
///     .data(r#"{"route":"/ping","method":"GET","max":5}"#)
///     .build()
///     .await?;
/// ```
pub struct ConfigurationFactory<'a> {
    db: &'a DatabaseConnection,
    name: String,
    category: String,
    status: i32,
    data: String,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'a> ConfigurationFactory<'a> {
    /// Creates a new ConfigurationFactory with default values.
    ///
    /// Defaults:
    /// - name: `"configuration_{id}"` where id is auto-incremented
    /// - category: `"blockIP"`
    /// - status: enabled
    /// - data: empty
    /// - validity window: one hour before now until one hour after now
    /// - updated_at: now
    ///
    /// # Arguments
    /// - `db` - Database connection for inserting the entity
    pub fn new(db: &'a DatabaseConnection) -> Self {
        let id = next_id();
        let now = Utc::now();
        Self {
            db,
            name: format!("configuration_{}", id),
            category: "blockIP".to_string(),
            status: STATUS_ENABLED,
            data: String::new(),
            started_at: now - Duration::hours(1),
            ended_at: now + Duration::hours(1),
            updated_at: now,
        }
    }

    /// Sets the unique name of the row.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the category discriminator.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Sets the raw payload.
    pub fn data(mut self, data: impl Into<String>) -> Self {
        self.data = data.into();
        self
    }

    /// Marks the row as disabled so refreshes ignore it.
    pub fn disabled(mut self) -> Self {
        self.status = STATUS_DISABLED;
        self
    }

    /// Sets the validity window.
    ///
    /// # Arguments
    /// - `started_at` - Row becomes effective after this instant
    /// - `ended_at` - Row stops being effective at this instant
    pub fn window(mut self, started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self.ended_at = ended_at;
        self
    }

    /// Sets the last update timestamp, which decides precedence between duplicate rows.
    pub fn updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }

    /// Builds and inserts the configuration row into the database.
    ///
    /// # Returns
    /// - `Ok(entity::configuration::Model)` - Created configuration row
    /// - `Err(DbErr)` - Database error during insert
    pub async fn build(self) -> Result<entity::configuration::Model, DbErr> {
        entity::configuration::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(self.name),
            category: ActiveValue::Set(self.category),
            status: ActiveValue::Set(self.status),
            data: ActiveValue::Set(self.data),
            owner: ActiveValue::Set("tester".to_string()),
            description: ActiveValue::Set(String::new()),
            started_at: ActiveValue::Set(self.started_at),
            ended_at: ActiveValue::Set(self.ended_at),
            created_at: ActiveValue::Set(self.updated_at),
            updated_at: ActiveValue::Set(self.updated_at),
        }
        .insert(self.db)
        .await
    }
}

/// Creates an enabled, currently valid configuration row.
///
/// Shorthand for `ConfigurationFactory::new(db).category(category).data(data).build().await`.
///
/// # Arguments
/// - `db` - Database connection
/// - `category` - Category discriminator
/// - `data` - Raw payload
///
/// # Returns
/// - `Ok(entity::configuration::Model)` - Created configuration row
/// - `Err(DbErr)` - Database error during insert
pub async fn create_configuration(
    db: &DatabaseConnection,
    category: &str,
    data: &str,
) -> Result<entity::configuration::Model, DbErr> {
    ConfigurationFactory::new(db)
        .category(category)
        .data(data)
        .build()
        .await
}
