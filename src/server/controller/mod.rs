//! HTTP request handlers.
//!
//! Controllers convert DTOs to service parameters, call the service layer and convert
//! the results back to DTOs. Guards such as the IP blocklist or the session interceptor
//! run as middleware before a controller is reached.

pub mod common;
pub mod configuration;
pub mod user;
