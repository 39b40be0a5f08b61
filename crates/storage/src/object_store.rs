//! Blob storage for dashboard artifacts.
//!
//! A thin layer over `object_store` that maps its errors onto [`HsmError`]
//! and picks a backend from configuration: authenticated GCS, a public HTTPS
//! bucket, an S3-compatible endpoint, a local directory or memory.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::http::HttpBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::{path::Path, ObjectStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use hsm_common::{HsmError, HsmResult};

use crate::credentials::ServiceAccountCredentials;
use crate::signer::{PlainUrlSigner, StoreUrlSigner, UrlSigner};

/// Which blob service artifacts are read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlobBackend {
    /// Google Cloud Storage with service-account credentials from the environment
    Gcs,
    /// Anonymous HTTPS reads from a public bucket, e.g. `https://storage.googleapis.com`
    PublicHttp { base_url: String },
    /// S3-compatible endpoint (MinIO for local development); keys from `AWS_*` variables
    S3 {
        endpoint: String,
        region: String,
        allow_http: bool,
    },
    /// A local directory laid out like the bucket
    Local { root: PathBuf },
    /// Process memory, for tests
    InMemory,
}

impl Default for BlobBackend {
    fn default() -> Self {
        BlobBackend::Gcs
    }
}

impl BlobBackend {
    pub fn name(&self) -> &'static str {
        match self {
            BlobBackend::Gcs => "gcs",
            BlobBackend::PublicHttp { .. } => "public_http",
            BlobBackend::S3 { .. } => "s3",
            BlobBackend::Local { .. } => "local",
            BlobBackend::InMemory => "in_memory",
        }
    }
}

/// Connection settings for [`ObjectStorage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStorageConfig {
    pub bucket: String,
    /// GCP project owning the bucket
    pub project_id: String,
    pub backend: BlobBackend,
}

impl Default for ObjectStorageConfig {
    fn default() -> Self {
        Self {
            bucket: "sygb-data".to_string(),
            project_id: "sy-bat".to_string(),
            backend: BlobBackend::Gcs,
        }
    }
}

/// Read access to named blobs. The only capability the loaders need.
#[async_trait]
pub trait BlobFetch: Send + Sync {
    async fn fetch(&self, key: &str) -> HsmResult<Bytes>;
}

/// Object storage client plus the URL signer matching its backend.
#[derive(Clone)]
pub struct ObjectStorage {
    store: Arc<dyn ObjectStore>,
    signer: Arc<dyn UrlSigner>,
    bucket: String,
    backend: &'static str,
}

impl std::fmt::Debug for ObjectStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStorage")
            .field("bucket", &self.bucket)
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl ObjectStorage {
    /// Connect using credentials from the process environment.
    pub fn new(config: &ObjectStorageConfig) -> HsmResult<Self> {
        Self::with_env_lookup(config, |name| std::env::var(name).ok())
    }

    /// Connect, resolving environment variables through `lookup`.
    ///
    /// Building a client performs no I/O; a missing credential fails here,
    /// before any request is made.
    pub fn with_env_lookup<F>(config: &ObjectStorageConfig, lookup: F) -> HsmResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bucket = config.bucket.clone();
        let build_err = |e: object_store::Error| {
            HsmError::Configuration(format!(
                "failed to create {} client: {}",
                config.backend.name(),
                e
            ))
        };

        let (store, signer): (Arc<dyn ObjectStore>, Arc<dyn UrlSigner>) = match &config.backend {
            BlobBackend::Gcs => {
                let credentials = ServiceAccountCredentials::from_lookup(&config.project_id, &lookup)?;
                let gcs = Arc::new(
                    GoogleCloudStorageBuilder::new()
                        .with_bucket_name(&bucket)
                        .with_service_account_key(credentials.to_key_json()?)
                        .build()
                        .map_err(build_err)?,
                );
                (gcs.clone(), Arc::new(StoreUrlSigner::new(gcs, &bucket)))
            }
            BlobBackend::PublicHttp { base_url } => {
                let signer = PlainUrlSigner::new(format!("{}/{}", base_url.trim_end_matches('/'), bucket));
                let http = HttpBuilder::new()
                    .with_url(signer.url_for(""))
                    .build()
                    .map_err(build_err)?;
                (Arc::new(http), Arc::new(signer))
            }
            BlobBackend::S3 {
                endpoint,
                region,
                allow_http,
            } => {
                let mut builder = AmazonS3Builder::new()
                    .with_endpoint(endpoint)
                    .with_bucket_name(&bucket)
                    .with_region(region)
                    .with_allow_http(*allow_http);
                if let Some(key) = lookup("AWS_ACCESS_KEY_ID") {
                    builder = builder.with_access_key_id(key);
                }
                if let Some(secret) = lookup("AWS_SECRET_ACCESS_KEY") {
                    builder = builder.with_secret_access_key(secret);
                }
                let s3 = Arc::new(builder.build().map_err(build_err)?);
                (s3.clone(), Arc::new(StoreUrlSigner::new(s3, &bucket)))
            }
            BlobBackend::Local { root } => {
                std::fs::create_dir_all(root).map_err(|e| {
                    HsmError::Configuration(format!(
                        "cannot use {} as local blob root: {}",
                        root.display(),
                        e
                    ))
                })?;
                let local = LocalFileSystem::new_with_prefix(root).map_err(build_err)?;
                let base = url::Url::from_directory_path(root)
                    .map(|u| u.to_string())
                    .unwrap_or_else(|_| format!("file://{}", root.display()));
                (Arc::new(local), Arc::new(PlainUrlSigner::new(base)))
            }
            BlobBackend::InMemory => (
                Arc::new(InMemory::new()),
                Arc::new(PlainUrlSigner::new(format!("memory://{}", bucket))),
            ),
        };

        info!(backend = config.backend.name(), bucket = %bucket, "Connected blob storage");
        Ok(Self {
            store,
            signer,
            bucket,
            backend: config.backend.name(),
        })
    }

    /// An empty in-memory store.
    pub fn in_memory(bucket: &str) -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            signer: Arc::new(PlainUrlSigner::new(format!("memory://{}", bucket))),
            bucket: bucket.to_string(),
            backend: BlobBackend::InMemory.name(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }

    /// Signer issuing URLs for objects in this store.
    pub fn signer(&self) -> Arc<dyn UrlSigner> {
        self.signer.clone()
    }

    /// Write bytes to a key.
    #[instrument(skip(self, data), fields(bucket = %self.bucket, path = %path))]
    pub async fn put(&self, path: &str, data: Bytes) -> HsmResult<()> {
        debug!(size = data.len(), "Writing object");
        self.store
            .put(&Path::from(path), data.into())
            .await
            .map_err(|e| HsmError::Internal(format!("failed to write {}: {}", path, e)))?;
        Ok(())
    }

    /// Read a whole object.
    #[instrument(skip(self), fields(bucket = %self.bucket, path = %path))]
    pub async fn get(&self, path: &str) -> HsmResult<Bytes> {
        let result = self.store.get(&Path::from(path)).await.map_err(|e| match e {
            object_store::Error::NotFound { .. } => {
                HsmError::remote_fetch(path, format!("object not found in bucket {}", self.bucket))
            }
            e => HsmError::remote_fetch(path, e.to_string()),
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| HsmError::remote_fetch(path, format!("failed to read body: {}", e)))?;

        debug!(size = bytes.len(), "Read object");
        Ok(bytes)
    }

    /// Check if an object exists.
    pub async fn exists(&self, path: &str) -> HsmResult<bool> {
        match self.store.head(&Path::from(path)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(HsmError::remote_fetch(path, e.to_string())),
        }
    }

    /// List keys under a prefix.
    pub async fn list(&self, prefix: &str) -> HsmResult<Vec<String>> {
        use futures::TryStreamExt;

        let prefix_path = Path::from(prefix);
        let metas: Vec<_> = self
            .store
            .list(Some(&prefix_path))
            .try_collect()
            .await
            .map_err(|e| HsmError::remote_fetch(prefix, format!("list failed: {}", e)))?;

        let mut keys: Vec<String> = metas.into_iter().map(|m| m.location.to_string()).collect();
        keys.sort();
        Ok(keys)
    }
}

#[async_trait]
impl BlobFetch for ObjectStorage {
    async fn fetch(&self, key: &str) -> HsmResult<Bytes> {
        self.get(key).await
    }
}
