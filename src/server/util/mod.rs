//! Small helpers shared by the middleware and interceptors.

pub mod cookie;
