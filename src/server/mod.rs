//! Server-side API backend and request interception.
//!
//! This module contains the complete backend implementation: API endpoints, the
//! configuration data layer, and the runtime components that operators reconfigure
//! through configuration rows without restarting the process.
//!
//! # Architecture
//!
//! - **Controller Layer** (`controller/`) - HTTP request handlers and DTO conversion
//! - **Service Layer** (`service/`) - Business logic, refresh and the intercepted HTTP client
//! - **Data Layer** (`data/`) - Database operations and entity-to-domain model conversion
//! - **Model Layer** (`model/`) - Domain models and operation-specific parameter types
//! - **Error Layer** (`error/`) - Application error types and HTTP response mapping
//! - **Middleware** (`middleware/`) - Request guards, tracking and script interception
//!
//! # Dynamic configuration
//!
//! - **Dynamic** (`dynamic/`) - IP blocklist, signed keys, mock time, router mocks,
//!   concurrency limits, session interceptor and the category dispatch of a refresh
//! - **Interceptor** (`interceptor/`) - Script engine, request/response facades and the
//!   routing-key script registries
//! - **Routing** (`routing`) - Route table, routing keys and route template rendering
//!
//! # Infrastructure
//!
//! - **Configuration** (`config`) - Environment-based application configuration
//! - **State** (`state`) - Shared application state
//! - **Startup** (`startup`) - Initialization of database, sessions and clients
//! - **Router** (`router`) - Route declaration, middleware stack and API documentation
//! - **Scheduler** (`scheduler/`) - Cron job refreshing the dynamic configuration
//!
//! # Request Flow
//!
//! 1. **Middleware** resolves the client IP, applies the guards and resolves the route
//! 2. **Interceptor** runs the "before" script of the route, if any
//! 3. **Router** routes the (possibly rewritten) request to a controller
//! 4. **Controller** calls the service, which calls the data layer
//! 5. **Interceptor** runs the "after" script on the response

pub mod config;
pub mod controller;
pub mod data;
pub mod dynamic;
pub mod error;
pub mod interceptor;
pub mod middleware;
pub mod model;
pub mod router;
pub mod routing;
pub mod scheduler;
pub mod service;
pub mod startup;
pub mod state;
pub mod util;
