//! Script interceptors for inbound and outbound HTTP traffic.
//!
//! - `registry` - routing key to compiled script tables, one per direction
//! - `facade` - script-visible request/response projections with change tracking
//! - `engine` - the shared rhai engine compiling and running the scripts

pub mod engine;
pub mod facade;
pub mod registry;
