use async_trait::async_trait;
use aws_sdk_s3 as s3;
use axum::body::{Body, Bytes};
use s3::error::DisplayErrorContext;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// StoredObject
///
/// An object fetched from storage. The body is a stream; callers forward it
/// without buffering.
pub struct StoredObject {
    pub body: Body,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("key does not exist: {key}")]
    NotFound { key: String },
    #[error("{0}")]
    Backend(String),
}

// 1. StorageService Contract
/// StorageService
///
/// The object-store contract the gateway depends on. Swappable between the real
/// S3 client and the in-memory mock without touching handlers.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Ensures the configured bucket exists. Used in local runs to provision MinIO.
    async fn ensure_bucket_exists(&self);

    /// Fetches the object stored under `key`. A single attempt; retries are the
    /// implementation's business.
    async fn get_object(&self, key: &str) -> Result<StoredObject, StorageError>;
}

// 2. The Real Implementation (S3/MinIO)
/// S3StorageClient
///
/// AWS SDK backed implementation. With a custom endpoint it talks to MinIO,
/// which needs path-style addressing.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
}

impl S3StorageClient {
    pub async fn new(
        endpoint: Option<&str>,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let mut builder = s3::Config::builder()
            .credentials_provider(credentials)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest();

        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: s3::Client::from_conf(builder.build()),
            bucket_name: bucket.to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn ensure_bucket_exists(&self) {
        // CreateBucket on an existing bucket fails harmlessly.
        let _ = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await;
    }

    async fn get_object(&self, key: &str) -> Result<StoredObject, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(service_err) if service_err.is_no_such_key() => StorageError::NotFound {
                    key: key.to_string(),
                },
                _ => StorageError::Backend(DisplayErrorContext(&err).to_string()),
            })?;

        let content_length = output
            .content_length()
            .and_then(|len| u64::try_from(len).ok());
        let content_type = output.content_type().map(str::to_string);

        // Re-chunk the SDK byte stream into an axum body as it arrives.
        let chunks = futures::stream::unfold(output.body, |mut body| async move {
            body.next().await.map(|chunk| (chunk, body))
        });

        Ok(StoredObject {
            body: Body::from_stream(chunks),
            content_length,
            content_type,
        })
    }
}

// 3. The Mock Implementation (For Tests)
/// MockStorageService
///
/// In-memory object store for tests. Records every requested key so tests can
/// assert which storage key a request resolved to.
#[derive(Default)]
pub struct MockStorageService {
    objects: HashMap<String, Bytes>,
    /// When true, every fetch fails with a backend error.
    pub should_fail: bool,
    requested: Mutex<Vec<String>>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn with_object(mut self, key: impl Into<String>, data: impl Into<Bytes>) -> Self {
        self.objects.insert(key.into(), data.into());
        self
    }

    /// Keys passed to `get_object`, in call order.
    pub fn requested_keys(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|keys| keys.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {
        // No-op in mock environment.
    }

    async fn get_object(&self, key: &str) -> Result<StoredObject, StorageError> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(key.to_string());
        }

        if self.should_fail {
            return Err(StorageError::Backend(
                "Mock Storage Error: Simulation requested".to_string(),
            ));
        }

        let data = self
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                key: key.to_string(),
            })?;

        Ok(StoredObject {
            content_length: Some(data.len() as u64),
            content_type: None,
            body: Body::from(data),
        })
    }
}

/// StorageState
///
/// The shared handle to the storage service held by the application state.
pub type StorageState = Arc<dyn StorageService>;
