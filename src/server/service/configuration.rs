use chrono::Utc;
use sea_orm::DatabaseConnection;
use std::time::Duration;
use tracing::info;

use crate::{
    model::configuration::{DynamicSnapshotDto, PaginatedConfigurationsDto, RefreshSummaryDto},
    server::{
        data::configuration::ConfigurationRepository,
        dynamic::DynamicConfig,
        error::AppError,
        model::configuration::{Configuration, CreateConfigurationParam, UpdateConfigurationParam},
    },
};

pub struct ConfigurationService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ConfigurationService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a configuration row
    ///
    /// The row only takes effect on the next refresh.
    pub async fn create(&self, params: CreateConfigurationParam) -> Result<Configuration, AppError> {
        if params.name.trim().is_empty() {
            return Err(AppError::BadRequest("Name is required".to_string()));
        }
        if params.category.trim().is_empty() {
            return Err(AppError::BadRequest("Category is required".to_string()));
        }
        if params.started_at >= params.ended_at {
            return Err(AppError::BadRequest(
                "startedAt must be before endedAt".to_string(),
            ));
        }

        let repo = ConfigurationRepository::new(self.db);

        Ok(repo.create(params).await?)
    }

    /// Gets a configuration row by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<Configuration>, AppError> {
        let repo = ConfigurationRepository::new(self.db);

        Ok(repo.get_by_id(id).await?)
    }

    /// Gets a page of configuration rows, optionally of one category
    pub async fn get_paginated(
        &self,
        category: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> Result<PaginatedConfigurationsDto, AppError> {
        let repo = ConfigurationRepository::new(self.db);

        let (configurations, total) = repo.get_paginated(category, page, per_page).await?;

        let total_pages = if per_page > 0 {
            (total as f64 / per_page as f64).ceil() as u64
        } else {
            0
        };

        Ok(PaginatedConfigurationsDto {
            configurations: configurations
                .into_iter()
                .map(Configuration::into_dto)
                .collect(),
            total,
            page,
            per_page,
            total_pages,
        })
    }

    /// Updates a configuration row
    /// Returns None if the row doesn't exist
    pub async fn update(
        &self,
        params: UpdateConfigurationParam,
    ) -> Result<Option<Configuration>, AppError> {
        let repo = ConfigurationRepository::new(self.db);

        let Some(existing) = repo.get_by_id(params.id).await? else {
            return Ok(None);
        };

        let started_at = params.started_at.unwrap_or(existing.started_at);
        let ended_at = params.ended_at.unwrap_or(existing.ended_at);
        if started_at >= ended_at {
            return Err(AppError::BadRequest(
                "startedAt must be before endedAt".to_string(),
            ));
        }

        Ok(Some(repo.update(params).await?))
    }

    /// Deletes a configuration row
    /// Returns true if deleted, false if not found
    pub async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let repo = ConfigurationRepository::new(self.db);

        Ok(repo.delete(id).await?)
    }

    /// Loads the rows in effect and pushes them into the runtime components.
    ///
    /// The validity window is evaluated against the wall clock, never the mock time.
    /// When the query fails or runs past `timeout` nothing is applied and the previous
    /// state stays in effect. Refreshes run one at a time, so a slow refresh cannot apply
    /// older rows over a newer one.
    ///
    /// # Arguments
    /// - `dynamic` - Components to configure
    /// - `timeout` - Deadline of the storage query
    ///
    /// # Returns
    /// - `Ok(RefreshSummaryDto)` - Rows loaded and payloads applied per category
    /// - `Err(AppError::Timeout(_))` - Query exceeded the deadline
    /// - `Err(AppError::DbErr(_))` - Query failed
    pub async fn refresh(
        &self,
        dynamic: &DynamicConfig,
        timeout: Duration,
    ) -> Result<RefreshSummaryDto, AppError> {
        let repo = ConfigurationRepository::new(self.db);
        let _refreshing = dynamic.refresh_lock.lock().await;

        let rows = tokio::time::timeout(timeout, repo.get_available(Utc::now()))
            .await
            .map_err(|_| {
                AppError::Timeout(format!(
                    "Configuration query exceeded {}ms",
                    timeout.as_millis()
                ))
            })??;

        let summary = dynamic.apply(&rows);

        info!(
            rows = summary.rows,
            server_interceptors = dynamic.server_interceptors.keys().len(),
            client_interceptors = dynamic.client_interceptors.keys().len(),
            "Dynamic configuration applied"
        );

        Ok(summary)
    }

    /// Summary of the state currently in effect
    pub fn snapshot(dynamic: &DynamicConfig) -> DynamicSnapshotDto {
        dynamic.snapshot()
    }
}
