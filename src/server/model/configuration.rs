//! Configuration row domain models and parameters.
//!
//! A configuration row carries one payload for one dynamic component, selected by its
//! category. Rows are converted from entities at the repository boundary and into DTOs
//! at the controller boundary.

use chrono::{DateTime, Utc};

use crate::model::configuration::{
    ConfigurationDto, ConfigurationStatus, CreateConfigurationDto, UpdateConfigurationDto,
};

/// Category of mock time rows.
pub const CATEGORY_MOCK_TIME: &str = "mockTime";
/// Category of IP blocklist rows.
pub const CATEGORY_BLOCK_IP: &str = "blockIP";
/// Category of signed key rows.
pub const CATEGORY_SIGNED_KEY: &str = "signedKey";
/// Category of router mock rows.
pub const CATEGORY_ROUTER_MOCK: &str = "router";
/// Category of router concurrency rows.
pub const CATEGORY_ROUTER_CONCURRENCY: &str = "routerConcurrency";
/// Category of the session interceptor row.
pub const CATEGORY_SESSION_INTERCEPTOR: &str = "sessionInterceptor";
/// Category of inbound request interceptor scripts.
pub const CATEGORY_HTTP_SERVER_INTERCEPTOR: &str = "httpServerInterceptor";
/// Category of outbound request interceptor scripts.
pub const CATEGORY_HTTP_CLIENT_INTERCEPTOR: &str = "httpClientInterceptor";

/// Configuration row.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub id: i32,
    /// Unique operator-facing name.
    pub name: String,
    /// Component the payload is meant for.
    pub category: String,
    pub status: ConfigurationStatus,
    /// Raw payload, JSON or a plain string depending on the category.
    pub data: String,
    pub owner: String,
    pub description: String,
    /// The row is active strictly between `started_at` and `ended_at`.
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Configuration {
    /// Converts an entity model to a domain model at the repository boundary.
    pub fn from_entity(entity: entity::configuration::Model) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            category: entity.category,
            status: ConfigurationStatus::from_i32(entity.status),
            data: entity.data,
            owner: entity.owner,
            description: entity.description,
            started_at: entity.started_at,
            ended_at: entity.ended_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }

    /// Converts domain model to DTO for API responses.
    pub fn into_dto(self) -> ConfigurationDto {
        ConfigurationDto {
            id: self.id,
            name: self.name,
            category: self.category,
            status: self.status,
            data: self.data,
            owner: self.owner,
            description: self.description,
            started_at: self.started_at,
            ended_at: self.ended_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Parameters for creating a configuration row.
#[derive(Debug, Clone)]
pub struct CreateConfigurationParam {
    pub name: String,
    pub category: String,
    pub status: ConfigurationStatus,
    pub data: String,
    pub owner: String,
    pub description: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl From<CreateConfigurationDto> for CreateConfigurationParam {
    fn from(dto: CreateConfigurationDto) -> Self {
        Self {
            name: dto.name,
            category: dto.category,
            status: dto.status,
            data: dto.data,
            owner: dto.owner,
            description: dto.description,
            started_at: dto.started_at,
            ended_at: dto.ended_at,
        }
    }
}

/// Parameters for updating a configuration row. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateConfigurationParam {
    pub id: i32,
    pub status: Option<ConfigurationStatus>,
    pub data: Option<String>,
    pub description: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl UpdateConfigurationParam {
    pub fn from_dto(id: i32, dto: UpdateConfigurationDto) -> Self {
        Self {
            id,
            status: dto.status,
            data: dto.data,
            description: dto.description,
            started_at: dto.started_at,
            ended_at: dto.ended_at,
        }
    }
}
