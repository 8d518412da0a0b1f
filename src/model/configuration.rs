use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Whether a configuration row takes part in refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConfigurationStatus {
    Enabled,
    Disabled,
}

impl ConfigurationStatus {
    /// Database representation of the status.
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Enabled => 1,
            Self::Disabled => 2,
        }
    }

    /// Parses the database representation, treating unknown values as disabled.
    pub fn from_i32(value: i32) -> Self {
        match value {
            1 => Self::Enabled,
            _ => Self::Disabled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationDto {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub status: ConfigurationStatus,
    pub data: String,
    pub owner: String,
    pub description: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateConfigurationDto {
    pub name: String,
    pub category: String,
    #[serde(default = "default_status")]
    pub status: ConfigurationStatus,
    pub data: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub description: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

fn default_status() -> ConfigurationStatus {
    ConfigurationStatus::Enabled
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConfigurationDto {
    pub status: Option<ConfigurationStatus>,
    pub data: Option<String>,
    pub description: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedConfigurationsDto {
    pub configurations: Vec<ConfigurationDto>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

/// Outcome of one configuration refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummaryDto {
    /// Number of available rows loaded from storage.
    pub rows: usize,
    /// Number of rows applied per category.
    pub categories: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouterConcurrencyDto {
    pub key: String,
    pub current: u32,
    pub max: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionInterceptorDto {
    pub message: String,
    pub allow_accounts: Vec<String>,
    pub allow_routes: Vec<String>,
}

/// Snapshot of the in-memory state built by the last refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DynamicSnapshotDto {
    pub server_interceptors: Vec<String>,
    pub client_interceptors: Vec<String>,
    pub blocked_ips: Vec<String>,
    pub router_mocks: Vec<String>,
    pub router_concurrency: Vec<RouterConcurrencyDto>,
    pub session_interceptor: Option<SessionInterceptorDto>,
    pub signed_key_count: usize,
    pub mock_time: Option<DateTime<Utc>>,
}
