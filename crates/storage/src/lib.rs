//! Storage abstractions for the HSM dashboard.
//!
//! Provides:
//! - Blob access over `object_store` (GCS, public HTTP, S3, local, memory)
//! - Service-account credentials read from the environment
//! - URL signing for objects served to the browser

pub mod credentials;
pub mod object_store;
pub mod signer;

pub use self::object_store::{BlobBackend, BlobFetch, ObjectStorage, ObjectStorageConfig};
pub use credentials::ServiceAccountCredentials;
pub use signer::{PlainUrlSigner, StoreUrlSigner, UrlSigner};
