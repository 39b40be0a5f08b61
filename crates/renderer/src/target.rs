//! Destinations for rendered band images.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use hsm_common::{HsmError, HsmResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Where a rendered band image lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "location", rename_all = "snake_case")]
pub enum ImageHandle {
    /// A file on local disk
    File(PathBuf),
    /// An object key in a blob store
    Object(String),
    /// An entry in a [`MemoryTarget`]
    Memory(String),
}

impl ImageHandle {
    /// Path or key as a plain string.
    pub fn location(&self) -> String {
        match self {
            ImageHandle::File(path) => path.display().to_string(),
            ImageHandle::Object(key) | ImageHandle::Memory(key) => key.clone(),
        }
    }
}

/// File name used for a band image.
pub fn image_file_name(band: &str) -> String {
    let safe: String = band
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("{}.png", safe)
}

/// A keyed store of PNG images, one per band name.
///
/// Methods are synchronous; rendering runs on a blocking thread.
pub trait ImageTarget: Send + Sync {
    /// Handle the image for `band` has (or would have) in this target.
    fn handle(&self, band: &str) -> ImageHandle;

    /// True when an image for `band` already exists.
    fn contains(&self, band: &str) -> HsmResult<bool>;

    /// Store an encoded PNG for `band`, replacing any existing image.
    fn write(&self, band: &str, png: &[u8]) -> HsmResult<ImageHandle>;
}

/// Local cache directory, created on first write.
#[derive(Debug, Clone)]
pub struct DirectoryTarget {
    root: PathBuf,
}

impl DirectoryTarget {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, band: &str) -> PathBuf {
        self.root.join(image_file_name(band))
    }
}

impl ImageTarget for DirectoryTarget {
    fn handle(&self, band: &str) -> ImageHandle {
        ImageHandle::File(self.path_for(band))
    }

    fn contains(&self, band: &str) -> HsmResult<bool> {
        Ok(self.path_for(band).is_file())
    }

    fn write(&self, band: &str, png: &[u8]) -> HsmResult<ImageHandle> {
        fs::create_dir_all(&self.root).map_err(|e| {
            HsmError::Internal(format!(
                "failed to create image directory {}: {}",
                self.root.display(),
                e
            ))
        })?;

        let path = self.path_for(band);
        fs::write(&path, png).map_err(|e| {
            HsmError::Internal(format!("failed to write {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), bytes = png.len(), "Wrote band image");
        Ok(ImageHandle::File(path))
    }
}

/// In-process image store.
#[derive(Debug, Default)]
pub struct MemoryTarget {
    images: Mutex<BTreeMap<String, Vec<u8>>>,
    writes: AtomicUsize,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoded PNG for a band, if one was written.
    pub fn get(&self, band: &str) -> Option<Vec<u8>> {
        self.images
            .lock()
            .ok()
            .and_then(|images| images.get(&image_file_name(band)).cloned())
    }

    /// Number of `write` calls made so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.images.lock().map(|images| images.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ImageTarget for MemoryTarget {
    fn handle(&self, band: &str) -> ImageHandle {
        ImageHandle::Memory(image_file_name(band))
    }

    fn contains(&self, band: &str) -> HsmResult<bool> {
        let images = self
            .images
            .lock()
            .map_err(|_| HsmError::Internal("memory image target lock poisoned".into()))?;
        Ok(images.contains_key(&image_file_name(band)))
    }

    fn write(&self, band: &str, png: &[u8]) -> HsmResult<ImageHandle> {
        let mut images = self
            .images
            .lock()
            .map_err(|_| HsmError::Internal("memory image target lock poisoned".into()))?;
        images.insert(image_file_name(band), png.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(self.handle(band))
    }
}
