//! Gatekeeper: an HTTP backend whose request handling is reconfigured at runtime.
//!
//! Operators store configuration rows (interceptor scripts, IP blocks, router mocks,
//! concurrency limits, ...) in the database. A periodic refresh loads the rows in
//! effect and swaps them into the running server without a restart.

pub mod model;
pub mod server;
