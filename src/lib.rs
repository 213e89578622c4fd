pub mod api;
pub mod builder;
pub mod catalog;
pub mod config;
pub mod pagination;

pub use api::{ApiClient, ApiError};
pub use config::{Config, ConfigError};
