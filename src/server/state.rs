//! Application state shared across all request handlers and middleware.
//!
//! This module defines the `AppState` struct which holds all shared resources and
//! dependencies needed by the application. The state is initialized once during startup
//! and then cloned for each request handler through Axum's state extraction.
//!
//! The state includes:
//! - Database connection pool for configuration rows
//! - Runtime components configured by the refresh (interceptors, blocklist, limiter, ...)
//! - Route table of every API route
//! - Intercepted HTTP client of the IP location upstream
//! - Deadline of the refresh query

use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;

use crate::server::{
    dynamic::DynamicConfig, routing::RouteTable, service::http_client::HttpClient,
};

/// Application state containing shared resources and dependencies.
///
/// All fields use cheap-to-clone types:
/// - `DatabaseConnection` is a connection pool (clones share the pool)
/// - `Arc<DynamicConfig>` and `Arc<RouteTable>` are reference-counted pointers
/// - `HttpClient` wraps a `reqwest::Client`, which uses an `Arc` internally
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool for accessing persistent storage.
    ///
    /// Holds the configuration rows and, through the same pool, the session store.
    pub db: DatabaseConnection,

    /// Runtime components driven by configuration rows.
    ///
    /// Read by every middleware on the request path and written only by a refresh,
    /// either scheduled or requested through the API.
    pub dynamic: Arc<DynamicConfig>,

    /// Method and template of every API route.
    ///
    /// Used by the route resolution middleware to find the template of a request
    /// before axum routes it.
    pub routes: Arc<RouteTable>,

    /// HTTP client bound to the IP location upstream.
    ///
    /// Outbound calls pass through the client interceptors of `dynamic`.
    pub location: HttpClient,

    /// Deadline of the storage query of a refresh.
    pub refresh_timeout: Duration,
}

impl AppState {
    /// Creates a new application state with the provided dependencies.
    ///
    /// # Arguments
    /// - `db` - Database connection pool
    /// - `dynamic` - Runtime components, shared with the refresh scheduler
    /// - `routes` - Route table recorded while building the API router
    /// - `location` - HTTP client of the IP location upstream
    /// - `refresh_timeout` - Deadline of the refresh query
    ///
    /// # Returns
    /// - `AppState` - Initialized application state ready for use
    pub fn new(
        db: DatabaseConnection,
        dynamic: Arc<DynamicConfig>,
        routes: Arc<RouteTable>,
        location: HttpClient,
        refresh_timeout: Duration,
    ) -> Self {
        Self {
            db,
            dynamic,
            routes,
            location,
            refresh_timeout,
        }
    }
}
