use crate::utils::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;

const DEFAULT_EXPIRATION_MS: u64 = 3_600_000;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// JWT configuration
    pub jwt: JwtConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Standard base64 encoded HMAC secret
    pub secret_key: String,
    pub expiration_ms: u64,
}

// Keeps the secret out of startup logs.
impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret_key", &"<redacted>")
            .field("expiration_ms", &self.expiration_ms)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let config = Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .map_err(|_| ConfigError::Invalid {
                        name: "PORT",
                        reason: "expected a port number".to_string(),
                    })?,
            },
            jwt: JwtConfig {
                secret_key: env::var("JWT_SECRET_KEY")
                    .map_err(|_| ConfigError::Missing("JWT_SECRET_KEY"))?,
                expiration_ms: parse_expiration(env::var("JWT_EXPIRATION_MS").ok())?,
            },
        };

        Ok(config)
    }
}

fn parse_expiration(raw: Option<String>) -> Result<u64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_EXPIRATION_MS);
    };

    let value: i64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name: "JWT_EXPIRATION_MS",
        reason: format!("'{}' is not an integer", raw),
    })?;

    if value <= 0 {
        return Err(ConfigError::NonPositiveTtl);
    }
    Ok(value as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiration_defaults_when_unset() {
        assert_eq!(parse_expiration(None).unwrap(), DEFAULT_EXPIRATION_MS);
    }

    #[test]
    fn test_expiration_parses_millis() {
        assert_eq!(parse_expiration(Some("1500".into())).unwrap(), 1500);
    }

    #[test]
    fn test_expiration_rejects_non_positive() {
        assert!(matches!(
            parse_expiration(Some("0".into())),
            Err(ConfigError::NonPositiveTtl)
        ));
        assert!(matches!(
            parse_expiration(Some("-5".into())),
            Err(ConfigError::NonPositiveTtl)
        ));
    }

    #[test]
    fn test_expiration_rejects_garbage() {
        assert!(matches!(
            parse_expiration(Some("soon".into())),
            Err(ConfigError::Invalid { name: "JWT_EXPIRATION_MS", .. })
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let jwt = JwtConfig {
            secret_key: "super-secret".to_string(),
            expiration_ms: 10,
        };
        let printed = format!("{:?}", jwt);
        assert!(!printed.contains("super-secret"));
    }
}
