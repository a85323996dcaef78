//! Configuration management for the API server
//!
//! Loads configuration from environment variables into a type-safe struct.
//! Extension objects (pool, mailer) are constructed once at startup from
//! these values and injected into application state; nothing reads the
//! environment after boot.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
//! - `API_HOST`: host to bind to (default: 0.0.0.0)
//! - `API_PORT`: port to bind to (default: 8080)
//! - `JWT_SECRET`: secret key for token signing (required, >= 32 chars)
//! - `SMTP_HOST` / `SMTP_PORT` / `SMTP_USERNAME` / `SMTP_PASSWORD`:
//!   relay settings; unset host means log-only mail
//! - `SMTP_FROM`: sender address (default: noreply@localhost)
//! - `SHOP_NAME`: shop display name used in emails (default: PartLedger)
//! - `SHOP_BASE_URL`: public URL used in emailed links
//! - `SALES_NOTIFY_EMAIL`: operational address receiving part-sold alerts
//! - `RUST_LOG`: log filter (default: info)

use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// SMTP configuration
    pub smtp: SmtpConfig,

    /// Shop identity used in emails and documents
    pub shop: ShopConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub secret: String,
}

/// SMTP configuration
///
/// Leaving `host` unset puts the mailer into log-only mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

/// Shop identity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopConfig {
    /// Display name used in email subjects and bodies
    pub name: String,

    /// Public base URL used when composing emailed links
    pub base_url: String,

    /// Operational address that receives part-sold notifications
    pub sales_notify_email: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or values fail to
    /// parse.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse::<u16>()?;

        let smtp_from =
            env::var("SMTP_FROM").unwrap_or_else(|_| "noreply@localhost".to_string());

        let shop_name = env::var("SHOP_NAME").unwrap_or_else(|_| "PartLedger".to_string());
        let base_url =
            env::var("SHOP_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
        let sales_notify_email =
            env::var("SALES_NOTIFY_EMAIL").unwrap_or_else(|_| smtp_from.clone());

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            smtp: SmtpConfig {
                host: env::var("SMTP_HOST").ok(),
                port: smtp_port,
                username: env::var("SMTP_USERNAME").ok(),
                password: env::var("SMTP_PASSWORD").ok(),
                from: smtp_from,
            },
            shop: ShopConfig {
                name: shop_name,
                base_url,
                sales_notify_email,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            },
            smtp: SmtpConfig {
                host: None,
                port: 587,
                username: None,
                password: None,
                from: "noreply@example.com".to_string(),
            },
            shop: ShopConfig {
                name: "PartLedger".to_string(),
                base_url: "http://localhost:8080".to_string(),
                sales_notify_email: "sales@example.com".to_string(),
            },
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(test_config().bind_address(), "127.0.0.1:8080");
    }
}
