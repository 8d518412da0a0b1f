use crate::{
    model::configuration::ConfigurationStatus,
    server::{
        data::configuration::ConfigurationRepository,
        model::configuration::{CreateConfigurationParam, UpdateConfigurationParam},
    },
};
use chrono::{Duration, Utc};
use sea_orm::{DbErr, EntityTrait, PaginatorTrait};
use test_utils::{builder::TestBuilder, factory, factory::configuration::ConfigurationFactory};

mod create;
mod delete;
mod get_available;
mod get_by_id;
mod get_paginated;
mod update;

/// Parameters of an enabled row valid for the next hour.
fn create_param(name: &str, category: &str, data: &str) -> CreateConfigurationParam {
    let now = Utc::now();
    CreateConfigurationParam {
        name: name.to_string(),
        category: category.to_string(),
        status: ConfigurationStatus::Enabled,
        data: data.to_string(),
        owner: "operator".to_string(),
        description: "test row".to_string(),
        started_at: now - Duration::minutes(1),
        ended_at: now + Duration::hours(1),
    }
}
