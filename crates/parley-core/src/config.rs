//! Configuration module
//!
//! Environment-driven configuration for the API binary. Everything has a
//! development-friendly default except `DATABASE_URL`; `validate` checks
//! cross-field requirements (e.g. the S3 backend needs a bucket).

use std::env;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_FILE_SIZE_BYTES: usize = 50 * 1024 * 1024;
const MAX_ATTACHMENTS_PER_MESSAGE: usize = 10;
const HISTORY_WINDOW: usize = 10;
const COMPLETION_MAX_TOKENS: u32 = 1000;
const COMPLETION_TEMPERATURE: f32 = 0.7;
const COMPLETION_TIMEOUT_SECS: u64 = 60;

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant specialized in financial \
analysis and document review. You help users analyze financial documents, investment risks, and \
market considerations. Provide clear, concise, and professional responses based on the context \
provided.";

/// Which blob-store backend to construct at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackendKind {
    S3,
    Local,
}

impl StorageBackendKind {
    fn parse(value: &str) -> Result<Self, anyhow::Error> {
        match value.to_lowercase().as_str() {
            "s3" => Ok(StorageBackendKind::S3),
            "local" => Ok(StorageBackendKind::Local),
            other => Err(anyhow::anyhow!(
                "STORAGE_BACKEND must be 's3' or 'local', got '{}'",
                other
            )),
        }
    }
}

/// Application configuration, loaded once at startup and injected everywhere.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,

    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,

    pub storage_backend: StorageBackendKind,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers
    pub local_storage_path: String,
    pub local_storage_base_url: String,

    pub max_file_size_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
    pub max_attachments_per_message: usize,

    pub completion_base_url: String,
    pub completion_api_key: String,
    pub completion_model: String,
    pub completion_max_tokens: u32,
    pub completion_temperature: f32,
    pub completion_timeout_seconds: u64,
    pub system_prompt: String,
    pub history_window: usize,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, anyhow::Error> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("Invalid value for {}: '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

fn env_list_or(key: &str, default: &[&str]) -> Vec<String> {
    match env::var(key) {
        Ok(raw) => raw
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect(),
        Err(_) => default.iter().map(|s| s.to_string()).collect(),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let config = Config {
            server_port: env_parse_or("SERVER_PORT", 3000)?,
            cors_origins: env_list_or("CORS_ORIGINS", &["*"]),
            environment: env_or("ENVIRONMENT", "development"),

            database_url,
            db_max_connections: env_parse_or("DB_MAX_CONNECTIONS", MAX_CONNECTIONS)?,
            db_timeout_seconds: env_parse_or("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS)?,

            storage_backend: StorageBackendKind::parse(&env_or("STORAGE_BACKEND", "local"))?,
            s3_bucket: env_opt("S3_BUCKET"),
            s3_region: env_opt("S3_REGION").or_else(|| env_opt("AWS_REGION")),
            s3_endpoint: env_opt("S3_ENDPOINT"),
            local_storage_path: env_or("LOCAL_STORAGE_PATH", "./data/uploads"),
            local_storage_base_url: env_or(
                "LOCAL_STORAGE_BASE_URL",
                "http://localhost:3000/uploads",
            ),

            max_file_size_bytes: env_parse_or("MAX_FILE_SIZE_BYTES", MAX_FILE_SIZE_BYTES)?,
            allowed_extensions: env_list_or(
                "ALLOWED_EXTENSIONS",
                &[
                    "txt", "pdf", "doc", "docx", "jpg", "jpeg", "png", "gif", "csv", "xlsx", "xls",
                    "ppt", "pptx", "md", "json", "xml",
                ],
            ),
            allowed_content_types: env_list_or(
                "ALLOWED_CONTENT_TYPES",
                &[
                    "text/plain",
                    "application/pdf",
                    "application/msword",
                    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                    "image/jpeg",
                    "image/png",
                    "image/gif",
                    "image/jpg",
                    "text/csv",
                    "application/vnd.ms-excel",
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                    "application/vnd.ms-powerpoint",
                    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
                    "text/markdown",
                    "application/json",
                    "application/xml",
                ],
            ),
            max_attachments_per_message: env_parse_or(
                "MAX_ATTACHMENTS_PER_MESSAGE",
                MAX_ATTACHMENTS_PER_MESSAGE,
            )?,

            completion_base_url: env_or("COMPLETION_BASE_URL", "https://api.openai.com/v1"),
            completion_api_key: env_or("COMPLETION_API_KEY", ""),
            completion_model: env_or("COMPLETION_MODEL", "gpt-4o-mini"),
            completion_max_tokens: env_parse_or("COMPLETION_MAX_TOKENS", COMPLETION_MAX_TOKENS)?,
            completion_temperature: env_parse_or(
                "COMPLETION_TEMPERATURE",
                COMPLETION_TEMPERATURE,
            )?,
            completion_timeout_seconds: env_parse_or(
                "COMPLETION_TIMEOUT_SECONDS",
                COMPLETION_TIMEOUT_SECS,
            )?,
            system_prompt: env_or("SYSTEM_PROMPT", DEFAULT_SYSTEM_PROMPT),
            history_window: env_parse_or("HISTORY_WINDOW", HISTORY_WINDOW)?,
        };

        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.storage_backend == StorageBackendKind::S3 {
            if self.s3_bucket.is_none() {
                anyhow::bail!("S3_BUCKET must be set when STORAGE_BACKEND=s3");
            }
            if self.s3_region.is_none() {
                anyhow::bail!("S3_REGION (or AWS_REGION) must be set when STORAGE_BACKEND=s3");
            }
        }
        if self.max_file_size_bytes == 0 {
            anyhow::bail!("MAX_FILE_SIZE_BYTES must be greater than zero");
        }
        if self.history_window == 0 {
            anyhow::bail!("HISTORY_WINDOW must be greater than zero");
        }
        Ok(())
    }
}
