pub mod config;
pub mod error;

pub use config::{Config, JwtConfig, ServerConfig};
pub use error::{ApiError, ApiResult, AuthError, ConfigError};
