//! API server configuration

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use quill_shared_config::{parse_env, CommonConfig, DatabaseConfig, Environment};

use crate::services::{posts::DEFAULT_PAGE_SIZE, AssetConfig, TokenConfig};

/// Minimum required length for JWT_SECRET to be considered secure
const MIN_JWT_SECRET_LENGTH: usize = 32;

const DEVELOPMENT_JWT_SECRET: &str = "development-secret-change-in-production";

/// Default cap on upload request bodies (5 MiB)
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// API server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Common configuration shared with other services
    pub common: CommonConfig,

    /// Server port (default: 8080)
    pub port: u16,

    /// JWT secret for signing identity tokens
    pub jwt_secret: String,

    /// Token lifetime (default: 1h)
    pub jwt_expiry: String,

    /// Directory holding uploaded images (default: image)
    pub upload_dir: PathBuf,

    /// Request body cap for image uploads
    pub max_upload_bytes: usize,

    /// Posts per page of the `posts` query
    pub posts_page_size: i64,

    /// CORS allowed origins (optional)
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// In production mode, this function requires:
    /// - `JWT_SECRET`: Must be set and at least 32 characters long
    /// - `DATABASE_URL`: Must be explicitly set (no insecure defaults)
    ///
    /// In development/staging mode, sensible defaults are used for convenience.
    pub fn from_env() -> Result<Self> {
        let is_production = Environment::from_env().is_production();

        let jwt_secret = Self::load_jwt_secret(is_production)?;

        let common = CommonConfig::from_env().context("Failed to load config")?;
        if is_production {
            common
                .database
                .validate_for_production()
                .context("Invalid database configuration")?;
        }

        let posts_page_size: i64 =
            parse_env("POSTS_PAGE_SIZE", DEFAULT_PAGE_SIZE).context("Invalid POSTS_PAGE_SIZE")?;
        if posts_page_size < 1 {
            bail!("POSTS_PAGE_SIZE must be at least 1 (got {})", posts_page_size);
        }

        Ok(Self {
            common,

            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid PORT value")?,

            jwt_secret,

            jwt_expiry: env::var("JWT_EXPIRY").unwrap_or_else(|_| "1h".to_string()),

            upload_dir: env::var("UPLOAD_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("image")),

            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)
                .context("Invalid MAX_UPLOAD_BYTES")?,

            posts_page_size,

            cors_allowed_origins: env::var("CORS_ORIGINS").ok().map(|s| {
                s.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }),
        })
    }

    /// Load and validate JWT_SECRET
    ///
    /// In production:
    /// - JWT_SECRET must be explicitly set
    /// - Must be at least MIN_JWT_SECRET_LENGTH characters
    ///
    /// In development: uses a default value with a warning
    fn load_jwt_secret(is_production: bool) -> Result<String> {
        match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => {
                if is_production && secret.len() < MIN_JWT_SECRET_LENGTH {
                    bail!(
                        "JWT_SECRET must be at least {} characters in production (got {})",
                        MIN_JWT_SECRET_LENGTH,
                        secret.len()
                    );
                }
                Ok(secret)
            }
            _ if is_production => {
                bail!(
                    "JWT_SECRET environment variable is required in production. \
                     Please set a secure secret of at least {} characters.",
                    MIN_JWT_SECRET_LENGTH
                );
            }
            _ => {
                tracing::warn!(
                    "JWT_SECRET not set, using insecure default. \
                     This is only acceptable in development mode."
                );
                Ok(DEVELOPMENT_JWT_SECRET.to_string())
            }
        }
    }

    /// Token service configuration
    pub fn token_config(&self) -> TokenConfig {
        TokenConfig::with_expiry_string(self.jwt_secret.clone(), &self.jwt_expiry)
    }

    /// Asset storage configuration
    pub fn asset_config(&self) -> AssetConfig {
        AssetConfig::new(self.upload_dir.clone())
    }

    /// Get database configuration
    pub fn database(&self) -> &DatabaseConfig {
        &self.common.database
    }

    /// Get environment mode
    pub fn environment(&self) -> Environment {
        self.common.environment
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.common.environment.is_production()
    }
}
