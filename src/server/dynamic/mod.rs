//! Runtime components driven by configuration rows.
//!
//! Each component keeps its state behind an atomically swapped pointer (or plain
//! atomics for the concurrency counters). Only a refresh writes; requests read.
//! `DynamicConfig` owns one instance of each and is shared through `AppState`, so
//! tests can build as many independent instances as they need.

pub mod concurrency;
pub mod ip_blocker;
pub mod mock_time;
pub mod refresh;
pub mod router_mock;
pub mod session_interceptor;
pub mod signed_keys;

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{
    model::configuration::{DynamicSnapshotDto, RouterConcurrencyDto},
    server::interceptor::{engine::ScriptEngine, registry::ScriptRegistry},
};

use self::{
    concurrency::RouterConcurrency, ip_blocker::IpBlocker, mock_time::MockTime,
    router_mock::RouterMocks, session_interceptor::SessionInterceptor, signed_keys::SignedKeys,
};

/// Every runtime component configured by the refresh.
pub struct DynamicConfig {
    pub engine: ScriptEngine,
    pub server_interceptors: ScriptRegistry,
    pub client_interceptors: ScriptRegistry,
    pub ip_blocker: IpBlocker,
    pub signed_keys: SignedKeys,
    pub mock_time: Arc<MockTime>,
    pub router_mocks: RouterMocks,
    pub router_concurrency: Arc<RouterConcurrency>,
    pub session_interceptor: SessionInterceptor,
    /// Held across the query and apply of a refresh, so overlapping refreshes apply
    /// in the order they queried.
    pub refresh_lock: Mutex<()>,
}

impl DynamicConfig {
    /// Creates the components in their unconfigured state.
    ///
    /// # Arguments
    /// - `route_keys` - `METHOD ROUTE` of every API route, tracked by the concurrency limiter
    /// - `signed_keys` - Startup signing keys
    /// - `max_operations` - Operation budget of a single script run
    pub fn new(route_keys: Vec<String>, signed_keys: Vec<String>, max_operations: u64) -> Self {
        let mock_time = Arc::new(MockTime::new());

        Self {
            engine: ScriptEngine::new(mock_time.clone(), max_operations),
            server_interceptors: ScriptRegistry::new(),
            client_interceptors: ScriptRegistry::new(),
            ip_blocker: IpBlocker::new(),
            signed_keys: SignedKeys::new(signed_keys),
            mock_time,
            router_mocks: RouterMocks::new(),
            router_concurrency: Arc::new(RouterConcurrency::new(route_keys)),
            session_interceptor: SessionInterceptor::new(),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Summary of the state currently in effect.
    pub fn snapshot(&self) -> DynamicSnapshotDto {
        DynamicSnapshotDto {
            server_interceptors: self.server_interceptors.keys(),
            client_interceptors: self.client_interceptors.keys(),
            blocked_ips: self.ip_blocker.entries(),
            router_mocks: self.router_mocks.keys(),
            router_concurrency: self
                .router_concurrency
                .snapshot()
                .into_iter()
                .map(|(key, current, max)| RouterConcurrencyDto { key, current, max })
                .collect(),
            session_interceptor: self.session_interceptor.to_dto(),
            signed_key_count: self.signed_keys.keys().len(),
            mock_time: self.mock_time.get(),
        }
    }
}
