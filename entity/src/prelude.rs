pub use super::configuration::Entity as Configuration;
