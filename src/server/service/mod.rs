//! Service layer for business logic and orchestration.
//!
//! This module contains the service layer of the application, which sits between the
//! controller (API) layer and the data (repository) layer. Services are responsible for:
//!
//! - **Business Logic**: Validating configuration rows before they are stored
//! - **Orchestration**: Loading active rows and pushing them into the runtime components
//! - **Outbound Calls**: Sending intercepted requests to upstream services

pub mod configuration;
pub mod http_client;
pub mod location;
