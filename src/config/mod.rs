//! Configuration system
//!
//! Loads ~/.config/wikijson/config.yaml, which names:
//! - The SQLite database holding the wikis table
//! - The snapshot cache directory
//! - The shared invalidation timestamp store and its key namespace

mod wikijson_config;
pub mod validation;

pub use validation::{validate_config, validate_config_result, ValidationError};
pub use wikijson_config::WikiJsonConfig;
