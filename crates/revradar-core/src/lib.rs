pub mod app_config;
pub mod config;
pub mod store;
pub mod text;
mod types;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use store::ReviewStore;
pub use text::clean_text;
pub use types::{filter_newer_than, Branch, Company, Credential, Review, Reply};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
