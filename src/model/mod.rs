//! Wire-level DTOs shared by controllers and API clients.

pub mod api;
pub mod configuration;
pub mod user;
