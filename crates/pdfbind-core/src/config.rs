//! Configuration module
//!
//! Env-driven configuration for the merge service: server, storage backend,
//! and upload limits. Absence of a required setting is a startup error, not
//! a per-request one.

use std::env;

use crate::constants::{DEFAULT_MAX_BATCH_SIZE_BYTES, GRANT_EXPIRY_SECS};

const DEFAULT_SERVER_PORT: u16 = 3000;

/// Storage backend selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Local,
}

impl StorageBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "s3" => Some(StorageBackend::S3),
            "local" => Some(StorageBackend::Local),
            _ => None,
        }
    }
}

/// Application configuration for the merge service.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub storage_backend: StorageBackend,
    // S3 backend
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    // Local backend (development and tests)
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Upload limits and grant lifetime
    pub max_batch_size_bytes: u64,
    pub grant_expiry_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let server_port = env_parse("PDFBIND_SERVER_PORT", DEFAULT_SERVER_PORT)?;

        let cors_origins = env::var("PDFBIND_CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let environment =
            env::var("PDFBIND_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let storage_backend = match env::var("PDFBIND_STORAGE_BACKEND") {
            Ok(value) => StorageBackend::parse(&value).ok_or_else(|| {
                anyhow::anyhow!("Invalid PDFBIND_STORAGE_BACKEND '{}': use s3 or local", value)
            })?,
            Err(_) => StorageBackend::S3,
        };

        let config = Config {
            server_port,
            cors_origins,
            environment,
            storage_backend,
            s3_bucket: env_opt("PDFBIND_S3_BUCKET"),
            s3_region: env_opt("PDFBIND_S3_REGION").or_else(|| env_opt("AWS_REGION")),
            s3_endpoint: env_opt("PDFBIND_S3_ENDPOINT"),
            aws_access_key_id: env_opt("AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: env_opt("AWS_SECRET_ACCESS_KEY"),
            local_storage_path: env_opt("PDFBIND_LOCAL_STORAGE_PATH"),
            local_storage_base_url: env_opt("PDFBIND_LOCAL_STORAGE_BASE_URL"),
            max_batch_size_bytes: env_parse(
                "PDFBIND_MAX_BATCH_SIZE_BYTES",
                DEFAULT_MAX_BATCH_SIZE_BYTES,
            )?,
            grant_expiry_secs: env_parse("PDFBIND_GRANT_EXPIRY_SECS", GRANT_EXPIRY_SECS)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Fail fast on settings the selected backend cannot run without.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    anyhow::bail!("PDFBIND_S3_BUCKET is required for the s3 storage backend");
                }
                if self.s3_region.is_none() {
                    anyhow::bail!(
                        "PDFBIND_S3_REGION or AWS_REGION is required for the s3 storage backend"
                    );
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    anyhow::bail!(
                        "PDFBIND_LOCAL_STORAGE_PATH is required for the local storage backend"
                    );
                }
                if self.local_storage_base_url.is_none() {
                    anyhow::bail!(
                        "PDFBIND_LOCAL_STORAGE_BASE_URL is required for the local storage backend"
                    );
                }
            }
        }
        if self.max_batch_size_bytes == 0 {
            anyhow::bail!("PDFBIND_MAX_BATCH_SIZE_BYTES must be greater than zero");
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T, anyhow::Error>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}
