//! Time-limited URLs for objects the dashboard hands to a browser.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hsm_common::{HsmError, HsmResult};
use object_store::path::Path;
use object_store::signer::Signer;
use tracing::{debug, instrument};

/// Issues a URL a client can fetch `key` from.
#[async_trait]
pub trait UrlSigner: Send + Sync {
    async fn sign(&self, key: &str, expires_in: Duration) -> HsmResult<String>;
}

/// Signs with the store's own credentials (GCS V4 signatures, S3 presigning).
#[derive(Clone)]
pub struct StoreUrlSigner {
    signer: Arc<dyn Signer>,
    bucket: String,
}

impl StoreUrlSigner {
    pub fn new(signer: Arc<dyn Signer>, bucket: impl Into<String>) -> Self {
        Self {
            signer,
            bucket: bucket.into(),
        }
    }
}

impl std::fmt::Debug for StoreUrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreUrlSigner")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl UrlSigner for StoreUrlSigner {
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn sign(&self, key: &str, expires_in: Duration) -> HsmResult<String> {
        let url = self
            .signer
            .signed_url(http::Method::GET, &Path::from(key), expires_in)
            .await
            .map_err(|e| HsmError::remote_fetch(key, format!("failed to sign URL: {}", e)))?;
        debug!(expires_secs = expires_in.as_secs(), "Signed object URL");
        Ok(url.to_string())
    }
}

/// Builds plain `{base}/{key}` URLs with spaces percent-encoded.
///
/// Used for public buckets, where the legacy form is
/// `https://storage.googleapis.com/<bucket>/<key>`, and for local or
/// in-memory stores. Expiry is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainUrlSigner {
    base: String,
}

impl PlainUrlSigner {
    pub fn new(base: impl Into<String>) -> Self {
        let base: String = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// `https://storage.googleapis.com/<bucket>`.
    pub fn public_gcs(bucket: &str) -> Self {
        Self::new(format!("https://storage.googleapis.com/{}", bucket))
    }

    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.base, key.trim_start_matches('/').replace(' ', "%20"))
    }
}

#[async_trait]
impl UrlSigner for PlainUrlSigner {
    async fn sign(&self, key: &str, _expires_in: Duration) -> HsmResult<String> {
        Ok(self.url_for(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_gcs_url_encodes_spaces() {
        let signer = PlainUrlSigner::public_gcs("sygb-data");
        assert_eq!(
            signer.url_for("app_data/predictions_png/Myotis daubentonii_Foraging.png"),
            "https://storage.googleapis.com/sygb-data/app_data/predictions_png/Myotis%20daubentonii_Foraging.png"
        );
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let signer = PlainUrlSigner::new("memory://bucket/");
        assert_eq!(signer.url_for("/a.png"), "memory://bucket/a.png");
    }

    #[tokio::test]
    async fn test_plain_signer_ignores_expiry() {
        let signer = PlainUrlSigner::new("https://example.org/b");
        let url = signer.sign("k", Duration::from_secs(1)).await.unwrap();
        assert_eq!(url, "https://example.org/b/k");
    }
}
