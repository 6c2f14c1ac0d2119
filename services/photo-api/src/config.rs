//! Service configuration, assembled once at startup
//!
//! Values come from an optional `.env` file and the process environment.

use anyhow::{Context, Result};
use auth::JwtConfig;
use common::database::DatabaseConfig;
use config::{Config, Environment};
use serde::Deserialize;

/// Default upload limit: 10 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// HTTP server and file store settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    pub app_host: String,
    /// Port to bind
    pub app_port: u16,
    /// Root directory for photo files
    pub photo_dir: String,
    /// Largest accepted request body, in bytes
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Read server settings from the environment
    ///
    /// # Environment Variables
    /// - `APP_HOST`: Interface to bind (default: 0.0.0.0)
    /// - `APP_PORT`: Port to bind (default: 8080)
    /// - `PHOTO_DIR`: Photo root directory (default: photos)
    /// - `MAX_UPLOAD_BYTES`: Upload limit in bytes (default: 10 MiB)
    pub fn from_env() -> Result<Self> {
        let settings = Config::builder()
            .set_default("app_host", "0.0.0.0")?
            .set_default("app_port", 8080)?
            .set_default("photo_dir", "photos")?
            .set_default("max_upload_bytes", DEFAULT_MAX_UPLOAD_BYTES as u64)?
            .add_source(Environment::default().try_parsing(true))
            .build()
            .context("Failed to read server configuration")?;

        settings
            .try_deserialize()
            .context("Invalid server configuration")
    }

    /// Address to bind, as `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app_host, self.app_port)
    }
}

/// Complete service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
}

impl AppConfig {
    /// Load `.env` if present, then read every section from the environment
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        unsafe {
            std::env::remove_var("APP_HOST");
            std::env::remove_var("APP_PORT");
            std::env::remove_var("PHOTO_DIR");
            std::env::remove_var("MAX_UPLOAD_BYTES");
        }
    }

    #[test]
    #[serial]
    fn test_server_config_defaults() {
        clear_env();

        let config = ServerConfig::from_env().unwrap();

        assert_eq!(config.app_host, "0.0.0.0");
        assert_eq!(config.app_port, 8080);
        assert_eq!(config.photo_dir, "photos");
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    #[serial]
    fn test_server_config_from_env() {
        clear_env();
        unsafe {
            std::env::set_var("APP_HOST", "127.0.0.1");
            std::env::set_var("APP_PORT", "9090");
            std::env::set_var("PHOTO_DIR", "/var/lib/photos");
            std::env::set_var("MAX_UPLOAD_BYTES", "2048");
        }

        let config = ServerConfig::from_env().unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:9090");
        assert_eq!(config.photo_dir, "/var/lib/photos");
        assert_eq!(config.max_upload_bytes, 2048);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_port_is_rejected() {
        clear_env();
        unsafe {
            std::env::set_var("APP_PORT", "not-a-port");
        }

        assert!(ServerConfig::from_env().is_err());

        clear_env();
    }
}
