use std::env;

/// Name of the group whose members read the unscoped (public) export artifacts.
pub const UNLIMITED_GROUP: &str = "unlimited";

const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";

/// AppConfig
///
/// Holds the gateway's entire configuration. Immutable once loaded and shared with
/// handlers through `AppState`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls the local header bypass for auth.
    pub env: Env,
    // Socket address the HTTP listener binds to.
    pub bind_addr: String,
    // S3-compatible endpoint. `None` means the default AWS endpoint for the region.
    pub s3_endpoint: Option<String>,
    pub s3_region: String,
    pub s3_key: String,
    pub s3_secret: String,
    // Bucket holding the export artifacts.
    pub s3_bucket: String,
    // HMAC secret used to verify incoming JWTs.
    pub jwt_secret: String,
    // Restricted group served its own export variant.
    pub exports_group: String,
    // Explicit dataset allow-list. Empty means the project-code rule applies.
    pub export_datasets: Vec<String>,
}

/// Env
///
/// Runtime context: local development (MinIO, header bypass) or production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),
    #[error("{var} has an invalid value: {value:?}")]
    Invalid { var: &'static str, value: String },
}

impl Default for AppConfig {
    /// Safe, non-panicking values for test state setup.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: "0.0.0.0:3000".to_string(),
            s3_endpoint: Some("http://localhost:9000".to_string()),
            s3_region: "us-east-1".to_string(),
            s3_key: "admin".to_string(),
            s3_secret: "password".to_string(),
            s3_bucket: "exports-test".to_string(),
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            exports_group: "group_1".to_string(),
            export_datasets: Vec::new(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables. Production refuses to
    /// start without its secrets; local mode falls back to the MinIO defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            Ok("local") | Err(_) => Env::Local,
            Ok(other) => {
                return Err(ConfigError::Invalid {
                    var: "APP_ENV",
                    value: other.to_string(),
                });
            }
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let s3_region = env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let s3_bucket = env::var("S3_BUCKET_NAME").unwrap_or_else(|_| "exports".to_string());

        let exports_group = env::var("EXPORTS_GROUP").unwrap_or_else(|_| "group_1".to_string());
        if exports_group.trim().is_empty() || exports_group == UNLIMITED_GROUP {
            return Err(ConfigError::Invalid {
                var: "EXPORTS_GROUP",
                value: exports_group,
            });
        }

        let export_datasets: Vec<String> = env::var("EXPORT_DATASETS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        match env {
            Env::Local => Ok(Self {
                env: Env::Local,
                bind_addr,
                s3_endpoint: Some(
                    env::var("S3_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".to_string()),
                ),
                s3_region,
                s3_key: env::var("S3_ACCESS_KEY").unwrap_or_else(|_| "admin".to_string()),
                s3_secret: env::var("S3_SECRET_KEY").unwrap_or_else(|_| "password".to_string()),
                s3_bucket,
                jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
                exports_group,
                export_datasets,
            }),
            Env::Production => Ok(Self {
                env: Env::Production,
                bind_addr,
                s3_endpoint: env::var("S3_ENDPOINT").ok(),
                s3_region,
                s3_key: required("S3_ACCESS_KEY")?,
                s3_secret: required("S3_SECRET_KEY")?,
                s3_bucket,
                jwt_secret: required("JWT_SECRET")?,
                exports_group,
                export_datasets,
            }),
        }
    }
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    env::var(var).map_err(|_| ConfigError::Missing(var))
}
