//! Category dispatch of configuration rows.
//!
//! Every category has one handler in [`HANDLERS`]. All handlers run on every refresh,
//! so a category with no active rows resets its component.

use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::{
    model::configuration::RefreshSummaryDto,
    server::{
        dynamic::DynamicConfig,
        interceptor::registry::{ClientInterceptorConfig, ServerInterceptorConfig},
        model::configuration::{
            Configuration, CATEGORY_BLOCK_IP, CATEGORY_HTTP_CLIENT_INTERCEPTOR,
            CATEGORY_HTTP_SERVER_INTERCEPTOR, CATEGORY_MOCK_TIME, CATEGORY_ROUTER_CONCURRENCY,
            CATEGORY_ROUTER_MOCK, CATEGORY_SESSION_INTERCEPTOR, CATEGORY_SIGNED_KEY,
        },
    },
};

/// How the rows of one category are collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collect {
    /// Only the most recently updated row counts.
    Newest,
    /// Every active row counts.
    Accumulate,
}

/// Applies the collected payloads of one category and returns how many took effect.
pub type ApplyFn = fn(&DynamicConfig, &[String]) -> usize;

pub struct CategoryHandler {
    pub category: &'static str,
    pub collect: Collect,
    pub apply: ApplyFn,
}

pub const HANDLERS: &[CategoryHandler] = &[
    CategoryHandler {
        category: CATEGORY_MOCK_TIME,
        collect: Collect::Newest,
        apply: apply_mock_time,
    },
    CategoryHandler {
        category: CATEGORY_SIGNED_KEY,
        collect: Collect::Newest,
        apply: apply_signed_key,
    },
    CategoryHandler {
        category: CATEGORY_SESSION_INTERCEPTOR,
        collect: Collect::Newest,
        apply: apply_session_interceptor,
    },
    CategoryHandler {
        category: CATEGORY_BLOCK_IP,
        collect: Collect::Accumulate,
        apply: apply_block_ip,
    },
    CategoryHandler {
        category: CATEGORY_ROUTER_MOCK,
        collect: Collect::Accumulate,
        apply: apply_router_mock,
    },
    CategoryHandler {
        category: CATEGORY_ROUTER_CONCURRENCY,
        collect: Collect::Accumulate,
        apply: apply_router_concurrency,
    },
    CategoryHandler {
        category: CATEGORY_HTTP_SERVER_INTERCEPTOR,
        collect: Collect::Accumulate,
        apply: apply_server_interceptors,
    },
    CategoryHandler {
        category: CATEGORY_HTTP_CLIENT_INTERCEPTOR,
        collect: Collect::Accumulate,
        apply: apply_client_interceptors,
    },
];

fn apply_mock_time(config: &DynamicConfig, rows: &[String]) -> usize {
    match rows.first() {
        Some(raw) => usize::from(config.mock_time.set(raw)),
        None => {
            config.mock_time.clear();
            0
        }
    }
}

fn apply_signed_key(config: &DynamicConfig, rows: &[String]) -> usize {
    match rows.first() {
        Some(raw) => usize::from(config.signed_keys.set(raw)),
        None => {
            config.signed_keys.reset();
            0
        }
    }
}

fn apply_session_interceptor(config: &DynamicConfig, rows: &[String]) -> usize {
    match rows.first() {
        Some(raw) => usize::from(config.session_interceptor.set(raw)),
        None => {
            config.session_interceptor.unset();
            0
        }
    }
}

fn apply_block_ip(config: &DynamicConfig, rows: &[String]) -> usize {
    config.ip_blocker.reset(rows)
}

fn apply_router_mock(config: &DynamicConfig, rows: &[String]) -> usize {
    config.router_mocks.update(rows)
}

fn apply_router_concurrency(config: &DynamicConfig, rows: &[String]) -> usize {
    config.router_concurrency.reset_raw(rows)
}

fn apply_server_interceptors(config: &DynamicConfig, rows: &[String]) -> usize {
    config
        .server_interceptors
        .update::<ServerInterceptorConfig>(&config.engine, rows)
}

fn apply_client_interceptors(config: &DynamicConfig, rows: &[String]) -> usize {
    config
        .client_interceptors
        .update::<ClientInterceptorConfig>(&config.engine, rows)
}

impl DynamicConfig {
    /// Pushes a full set of active rows into the components.
    ///
    /// # Arguments
    /// - `rows` - Active rows ordered by `updated_at` descending
    ///
    /// # Returns
    /// - `RefreshSummaryDto` - Row count and number of applied payloads per category
    pub fn apply(&self, rows: &[Configuration]) -> RefreshSummaryDto {
        let mut buckets: HashMap<&str, Vec<String>> = HashMap::new();

        for row in rows {
            match HANDLERS.iter().find(|handler| handler.category == row.category) {
                Some(handler) => buckets
                    .entry(handler.category)
                    .or_default()
                    .push(row.data.clone()),
                None => debug!(category = %row.category, name = %row.name, "Unknown configuration category"),
            }
        }

        let mut categories = BTreeMap::new();
        for handler in HANDLERS {
            let mut values = buckets.remove(handler.category).unwrap_or_default();
            if handler.collect == Collect::Newest {
                values.truncate(1);
            }

            let applied = (handler.apply)(self, &values);
            categories.insert(handler.category.to_string(), applied);
        }

        info!(rows = rows.len(), "Configuration refreshed");

        RefreshSummaryDto {
            rows: rows.len(),
            categories,
        }
    }
}
