//! Mocked responses for routes, keyed by `METHOD ROUTE`.

use arc_swap::ArcSwap;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;

use crate::server::routing::{parse_router, route_key};

/// A `router` configuration row.
///
/// The wire key of the content type is spelled `cotentType` in stored rows; the correct
/// spelling is accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterMock {
    /// `METHOD /route/template`
    pub router: String,
    /// Mocked status, `0` for a delay-only mock.
    #[serde(default)]
    pub status: u16,
    #[serde(default, rename = "cotentType", alias = "contentType")]
    pub content_type: String,
    /// Mocked body, sent verbatim.
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub delay_seconds: u64,
    /// When non-empty, only requests whose path and query equal this value match.
    #[serde(default)]
    pub url: String,
}

impl RouterMock {
    /// Whether the mock only delays the request and lets the handler answer.
    pub fn is_delay_only(&self) -> bool {
        self.status == 0 && self.response.is_empty()
    }
}

/// Router mock table replaced wholesale on refresh.
#[derive(Debug)]
pub struct RouterMocks {
    mocks: ArcSwap<HashMap<String, Vec<RouterMock>>>,
}

impl RouterMocks {
    pub fn new() -> Self {
        Self {
            mocks: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Rebuilds the mock table from raw JSON rows.
    ///
    /// Rows that fail to decode or whose `router` lacks a method or route are logged and
    /// skipped. Within one route, url-specific mocks take precedence over catch-all ones.
    ///
    /// # Returns
    /// - `usize` - Number of mocks installed
    pub fn update(&self, raw: &[String]) -> usize {
        let mut mocks: HashMap<String, Vec<RouterMock>> = HashMap::new();
        let mut count = 0;

        for data in raw {
            let mock = match serde_json::from_str::<RouterMock>(data) {
                Ok(mock) => mock,
                Err(e) => {
                    error!(category = "router", "Invalid router mock: {}", e);
                    continue;
                }
            };
            let Some((method, route)) = parse_router(&mock.router) else {
                error!(category = "router", router = %mock.router, "Router mock without method or route");
                continue;
            };

            mocks.entry(route_key(&method, &route)).or_default().push(mock);
            count += 1;
        }

        for list in mocks.values_mut() {
            // stable sort keeps configuration order inside each group
            list.sort_by_key(|mock| mock.url.is_empty());
        }

        self.mocks.store(Arc::new(mocks));
        count
    }

    /// Finds the mock for a routing key and request URI.
    ///
    /// # Arguments
    /// - `key` - `METHOD ROUTE` of the resolved route
    /// - `uri` - Request path and query, compared against url-specific mocks
    pub fn find(&self, key: &str, uri: &str) -> Option<RouterMock> {
        self.mocks
            .load()
            .get(key)?
            .iter()
            .find(|mock| mock.url.is_empty() || mock.url == uri)
            .cloned()
    }

    /// Routing keys that have at least one mock, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.mocks.load().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for RouterMocks {
    fn default() -> Self {
        Self::new()
    }
}
