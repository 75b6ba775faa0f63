pub mod config;
pub mod database;
pub mod env;
pub mod error;
pub mod telemetry;

pub use config::Settings;
pub use env::EnvSource;
pub use error::{ConfigError, ConfigResult};
