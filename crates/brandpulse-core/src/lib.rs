//! Shared configuration for the brandpulse workspace: environment-driven
//! settings and the brand watch-list.

pub mod app_config;
pub mod brands;
pub mod config;
pub mod error;

pub use app_config::{AppConfig, Environment, ViralThresholds};
pub use brands::{
    load_brands, normalize_handle, parse_brands, BrandConfig, BrandsFile, Relationship,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::ConfigError;
