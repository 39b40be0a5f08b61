//! Image target that publishes band PNGs to the blob store.

use std::sync::Arc;

use bytes::Bytes;
use hsm_common::{HsmError, HsmResult};
use renderer::{image_file_name, DirectoryTarget, ImageHandle, ImageTarget};
use storage::ObjectStorage;
use tokio::runtime::Handle;

use crate::config::{DashboardConfig, PngOutput};

/// Writes band images to `{prefix}/{band}.png` in a bucket.
///
/// [`ImageTarget`] is synchronous, so calls block on the runtime. Use it
/// from a blocking thread (`spawn_blocking`), never from async code.
#[derive(Debug, Clone)]
pub struct BucketTarget {
    storage: Arc<ObjectStorage>,
    prefix: String,
    runtime: Handle,
}

impl BucketTarget {
    pub fn new(storage: Arc<ObjectStorage>, prefix: impl Into<String>, runtime: Handle) -> Self {
        Self {
            storage,
            prefix: prefix.into().trim_end_matches('/').to_string(),
            runtime,
        }
    }

    /// Object key of the image for `band`.
    pub fn key_for(&self, band: &str) -> String {
        if self.prefix.is_empty() {
            image_file_name(band)
        } else {
            format!("{}/{}", self.prefix, image_file_name(band))
        }
    }
}

impl ImageTarget for BucketTarget {
    fn handle(&self, band: &str) -> ImageHandle {
        ImageHandle::Object(self.key_for(band))
    }

    fn contains(&self, band: &str) -> HsmResult<bool> {
        self.runtime.block_on(self.storage.exists(&self.key_for(band)))
    }

    fn write(&self, band: &str, png: &[u8]) -> HsmResult<ImageHandle> {
        let key = self.key_for(band);
        self.runtime
            .block_on(self.storage.put(&key, Bytes::copy_from_slice(png)))?;
        Ok(ImageHandle::Object(key))
    }
}

/// The image target selected by `config.png_output`.
///
/// Must be called inside a tokio runtime when the bucket is selected.
pub fn image_target_for(
    config: &DashboardConfig,
    storage: Arc<ObjectStorage>,
) -> HsmResult<Arc<dyn ImageTarget>> {
    Ok(match &config.png_output {
        PngOutput::Directory { path } => Arc::new(DirectoryTarget::new(path.clone())),
        PngOutput::Bucket => {
            let runtime = Handle::try_current()
                .map_err(|e| HsmError::Internal(format!("no tokio runtime: {}", e)))?;
            Arc::new(BucketTarget::new(
                storage,
                config.artifacts.png_prefix(),
                runtime,
            ))
        }
    })
}
