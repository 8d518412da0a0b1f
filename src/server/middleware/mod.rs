//! Request middleware.
//!
//! The layers wrap the whole API router, outermost first:
//!
//! 1. session layer (tower-sessions)
//! 2. [`client_ip`] - resolves the client IP
//! 3. [`ip_blocker`] - rejects blocked IPs with 403
//! 4. [`tracker`] - signed `jt` tracking cookie
//! 5. [`route`] - resolves the route template and params
//! 6. [`concurrency`] - per-route concurrency ceiling, 429
//! 7. [`router_mock`] - mocked responses and delays
//! 8. [`session_interceptor`] - maintenance gate, 503
//! 9. [`interceptor`] - server interceptor scripts
//!
//! They run before axum routes the request, so an interceptor that rewrites the URI
//! changes which handler is called.

pub mod client_ip;
pub mod concurrency;
pub mod interceptor;
pub mod ip_blocker;
pub mod route;
pub mod router_mock;
pub mod session;
pub mod session_interceptor;
pub mod tracker;

#[cfg(test)]
mod test;
