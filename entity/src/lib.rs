//! SeaORM entities for the gatekeeper database.

pub mod prelude;

pub mod configuration;
