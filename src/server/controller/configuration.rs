use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::{
    model::{
        api::ErrorDto,
        configuration::{
            ConfigurationDto, CreateConfigurationDto, DynamicSnapshotDto,
            PaginatedConfigurationsDto, RefreshSummaryDto, UpdateConfigurationDto,
        },
    },
    server::{
        error::AppError,
        model::configuration::{CreateConfigurationParam, UpdateConfigurationParam},
        service::configuration::ConfigurationService,
        state::AppState,
    },
};

/// Tag for grouping configuration endpoints in OpenAPI documentation
pub static CONFIGURATION_TAG: &str = "configuration";

#[derive(Deserialize)]
pub struct ConfigurationListParams {
    #[serde(default)]
    pub page: u64,
    #[serde(default = "default_entries")]
    pub entries: u64,
    pub category: Option<String>,
}

fn default_entries() -> u64 {
    10
}

/// Get paginated configuration rows.
///
/// Returns configuration rows, most recently updated first, optionally restricted to
/// one category.
///
/// # Arguments
/// - `state` - Application state containing the database connection
/// - `params` - Pagination parameters (page and entries) and optional category
///
/// # Returns
/// - `200 OK` - Paginated list of configuration rows
/// - `500 Internal Server Error` - Database error
#[utoipa::path(
    get,
    path = "/configurations/v1",
    tag = CONFIGURATION_TAG,
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 0)"),
        ("entries" = Option<u64>, Query, description = "Items per page (default: 10)"),
        ("category" = Option<String>, Query, description = "Only rows of this category")
    ),
    responses(
        (status = 200, description = "Successfully retrieved configuration rows", body = PaginatedConfigurationsDto),
        (status = 500, description = "Internal server error", body = ErrorDto)
    ),
)]
pub async fn get_configurations(
    State(state): State<AppState>,
    Query(params): Query<ConfigurationListParams>,
) -> Result<impl IntoResponse, AppError> {
    let service = ConfigurationService::new(&state.db);

    let configurations = service
        .get_paginated(params.category.as_deref(), params.page, params.entries)
        .await?;

    Ok((StatusCode::OK, Json(configurations)))
}

/// Create a configuration row.
///
/// The row takes effect on the next refresh, scheduled or requested.
///
/// # Arguments
/// - `state` - Application state containing the database connection
/// - `payload` - Row data
///
/// # Returns
/// - `201 Created` - Successfully created row
/// - `400 Bad Request` - Invalid row data
/// - `500 Internal Server Error` - Database error, including a duplicate name
#[utoipa::path(
    post,
    path = "/configurations/v1",
    tag = CONFIGURATION_TAG,
    request_body = CreateConfigurationDto,
    responses(
        (status = 201, description = "Successfully created configuration row", body = ConfigurationDto),
        (status = 400, description = "Invalid configuration data", body = ErrorDto),
        (status = 500, description = "Internal server error", body = ErrorDto)
    ),
)]
pub async fn create_configuration(
    State(state): State<AppState>,
    Json(payload): Json<CreateConfigurationDto>,
) -> Result<impl IntoResponse, AppError> {
    let service = ConfigurationService::new(&state.db);

    let configuration = service
        .create(CreateConfigurationParam::from(payload))
        .await?;

    Ok((StatusCode::CREATED, Json(configuration.into_dto())))
}

/// Get a configuration row by ID.
///
/// # Returns
/// - `200 OK` - The row
/// - `404 Not Found` - No row with this ID
/// - `500 Internal Server Error` - Database error
#[utoipa::path(
    get,
    path = "/configurations/v1/{id}",
    tag = CONFIGURATION_TAG,
    params(
        ("id" = i32, Path, description = "Configuration row ID")
    ),
    responses(
        (status = 200, description = "Successfully retrieved configuration row", body = ConfigurationDto),
        (status = 404, description = "Configuration row not found", body = ErrorDto),
        (status = 500, description = "Internal server error", body = ErrorDto)
    ),
)]
pub async fn get_configuration(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let service = ConfigurationService::new(&state.db);

    let configuration = service
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Configuration not found".to_string()))?;

    Ok((StatusCode::OK, Json(configuration.into_dto())))
}

/// Update a configuration row.
///
/// Fields missing from the payload keep their values.
///
/// # Returns
/// - `200 OK` - The updated row
/// - `400 Bad Request` - The update leaves an empty validity window
/// - `404 Not Found` - No row with this ID
/// - `500 Internal Server Error` - Database error
#[utoipa::path(
    patch,
    path = "/configurations/v1/{id}",
    tag = CONFIGURATION_TAG,
    params(
        ("id" = i32, Path, description = "Configuration row ID")
    ),
    request_body = UpdateConfigurationDto,
    responses(
        (status = 200, description = "Successfully updated configuration row", body = ConfigurationDto),
        (status = 400, description = "Invalid configuration data", body = ErrorDto),
        (status = 404, description = "Configuration row not found", body = ErrorDto),
        (status = 500, description = "Internal server error", body = ErrorDto)
    ),
)]
pub async fn update_configuration(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateConfigurationDto>,
) -> Result<impl IntoResponse, AppError> {
    let service = ConfigurationService::new(&state.db);

    let configuration = service
        .update(UpdateConfigurationParam::from_dto(id, payload))
        .await?
        .ok_or_else(|| AppError::NotFound("Configuration not found".to_string()))?;

    Ok((StatusCode::OK, Json(configuration.into_dto())))
}

/// Delete a configuration row.
///
/// # Returns
/// - `204 No Content` - Row deleted
/// - `404 Not Found` - No row with this ID
/// - `500 Internal Server Error` - Database error
#[utoipa::path(
    delete,
    path = "/configurations/v1/{id}",
    tag = CONFIGURATION_TAG,
    params(
        ("id" = i32, Path, description = "Configuration row ID")
    ),
    responses(
        (status = 204, description = "Successfully deleted configuration row"),
        (status = 404, description = "Configuration row not found", body = ErrorDto),
        (status = 500, description = "Internal server error", body = ErrorDto)
    ),
)]
pub async fn delete_configuration(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let service = ConfigurationService::new(&state.db);

    if !service.delete(id).await? {
        return Err(AppError::NotFound("Configuration not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Refresh the runtime components from storage now.
///
/// # Returns
/// - `200 OK` - Rows loaded and payloads applied per category
/// - `504 Gateway Timeout` - The storage query exceeded the refresh deadline
/// - `500 Internal Server Error` - Database error; the previous state stays in effect
#[utoipa::path(
    post,
    path = "/configurations/v1/refresh",
    tag = CONFIGURATION_TAG,
    responses(
        (status = 200, description = "Configuration refreshed", body = RefreshSummaryDto),
        (status = 504, description = "Refresh timed out", body = ErrorDto),
        (status = 500, description = "Internal server error", body = ErrorDto)
    ),
)]
pub async fn refresh_configurations(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let service = ConfigurationService::new(&state.db);

    let summary = service
        .refresh(&state.dynamic, state.refresh_timeout)
        .await?;

    Ok((StatusCode::OK, Json(summary)))
}

/// Get the runtime state currently in effect.
///
/// # Returns
/// - `200 OK` - Snapshot of interceptors, blocklist, mocks, limits and mock time
#[utoipa::path(
    get,
    path = "/configurations/v1/current",
    tag = CONFIGURATION_TAG,
    responses(
        (status = 200, description = "Current runtime state", body = DynamicSnapshotDto)
    ),
)]
pub async fn get_current_configuration(State(state): State<AppState>) -> impl IntoResponse {
    Json(ConfigurationService::snapshot(&state.dynamic))
}
