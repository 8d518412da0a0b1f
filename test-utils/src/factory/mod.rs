//! Factory methods for creating test data.
//!
//! Factories insert rows with sensible defaults, reducing boilerplate in tests. Each
//! entity has a `Factory` struct for customization and a `create_*` convenience
//! function for quick default creation.
//!
//! # Basic Usage
//!
//! ```rust,ignore
//! use test_utils::factory;
//!
//! // Enabled, currently valid row with default payload
//! let row = factory::create_configuration(&db, "blockIP", "10.0.0.0/8").await?;
//!
//! // Customized row
//! let row = factory::configuration::ConfigurationFactory::new(&db)
//!     .category("httpServerInterceptor")
//!     .data(r#"{"router":"GET /ping","before":"resp.status = 418"}"#)
//!     .disabled()
//!     .build()
//!     .await?;
//! ```
//!
//! # Available Factories
//!
//! - `configuration` - Create dynamic configuration rows
//! - `helpers` - Unique id generation shared by factories

pub mod configuration;
pub mod helpers;

pub use configuration::create_configuration;
