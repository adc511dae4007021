/// Database connection and table creation
pub mod database;

/// Internet plan catalog
pub mod plans;

/// Application settings from config.toml and the environment
pub mod settings;

pub use settings::{AppConfig, BackendMode, load_app_configuration};
