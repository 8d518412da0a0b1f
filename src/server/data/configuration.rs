use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};

use crate::{
    model::configuration::ConfigurationStatus,
    server::model::configuration::{
        Configuration, CreateConfigurationParam, UpdateConfigurationParam,
    },
};

pub struct ConfigurationRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ConfigurationRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a configuration row
    pub async fn create(&self, params: CreateConfigurationParam) -> Result<Configuration, DbErr> {
        let now = Utc::now();

        let model = entity::configuration::ActiveModel {
            name: ActiveValue::Set(params.name),
            category: ActiveValue::Set(params.category),
            status: ActiveValue::Set(params.status.as_i32()),
            data: ActiveValue::Set(params.data),
            owner: ActiveValue::Set(params.owner),
            description: ActiveValue::Set(params.description),
            started_at: ActiveValue::Set(params.started_at),
            ended_at: ActiveValue::Set(params.ended_at),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        }
        .insert(self.db)
        .await?;

        Ok(Configuration::from_entity(model))
    }

    /// Gets a configuration row by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<Configuration>, DbErr> {
        let model = entity::prelude::Configuration::find_by_id(id)
            .one(self.db)
            .await?;

        Ok(model.map(Configuration::from_entity))
    }

    /// Gets a page of configuration rows, most recently updated first
    ///
    /// # Arguments
    /// - `category` - Only rows of this category, when set
    /// - `page` - Zero-based page index
    /// - `per_page` - Page size
    ///
    /// # Returns
    /// - `Ok((rows, total))` - Rows of the page and total number of matching rows
    pub async fn get_paginated(
        &self,
        category: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<Configuration>, u64), DbErr> {
        let mut query = entity::prelude::Configuration::find()
            .order_by_desc(entity::configuration::Column::UpdatedAt)
            .order_by_desc(entity::configuration::Column::Id);
        if let Some(category) = category {
            query = query.filter(entity::configuration::Column::Category.eq(category));
        }

        let paginator = query.paginate(self.db, per_page);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page).await?;

        Ok((rows.into_iter().map(Configuration::from_entity).collect(), total))
    }

    /// Updates a configuration row, leaving `None` fields unchanged
    pub async fn update(&self, params: UpdateConfigurationParam) -> Result<Configuration, DbErr> {
        let model = entity::prelude::Configuration::find_by_id(params.id)
            .one(self.db)
            .await?
            .ok_or(DbErr::RecordNotFound(format!(
                "Configuration with id {} not found",
                params.id
            )))?;

        let mut active_model: entity::configuration::ActiveModel = model.into();
        if let Some(status) = params.status {
            active_model.status = ActiveValue::Set(status.as_i32());
        }
        if let Some(data) = params.data {
            active_model.data = ActiveValue::Set(data);
        }
        if let Some(description) = params.description {
            active_model.description = ActiveValue::Set(description);
        }
        if let Some(started_at) = params.started_at {
            active_model.started_at = ActiveValue::Set(started_at);
        }
        if let Some(ended_at) = params.ended_at {
            active_model.ended_at = ActiveValue::Set(ended_at);
        }
        active_model.updated_at = ActiveValue::Set(Utc::now());

        let model = active_model.update(self.db).await?;

        Ok(Configuration::from_entity(model))
    }

    /// Deletes a configuration row
    ///
    /// # Returns
    /// - `Ok(true)` - Row deleted
    /// - `Ok(false)` - No row with this ID
    pub async fn delete(&self, id: i32) -> Result<bool, DbErr> {
        let result = entity::prelude::Configuration::delete_by_id(id)
            .exec(self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Gets the rows in effect at `now`
    ///
    /// Enabled rows with `started_at < now < ended_at`, most recently updated first so
    /// that "newest" categories resolve to the latest edit.
    pub async fn get_available(&self, now: DateTime<Utc>) -> Result<Vec<Configuration>, DbErr> {
        let rows = entity::prelude::Configuration::find()
            .filter(entity::configuration::Column::Status.eq(ConfigurationStatus::Enabled.as_i32()))
            .filter(entity::configuration::Column::StartedAt.lt(now))
            .filter(entity::configuration::Column::EndedAt.gt(now))
            .order_by_desc(entity::configuration::Column::UpdatedAt)
            .order_by_desc(entity::configuration::Column::Id)
            .all(self.db)
            .await?;

        Ok(rows.into_iter().map(Configuration::from_entity).collect())
    }
}
