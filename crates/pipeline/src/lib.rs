//! Startup pipeline of the HSM dashboard.
//!
//! Ties the data access layer, the band renderer and the aggregation
//! together at process start, then exposes read-only queries over the
//! resulting snapshot.

pub mod aggregation;
pub mod bucket_target;
pub mod config;
pub mod orchestrator;
pub mod query;

pub use aggregation::compute_dependence_ranges;
pub use bucket_target::{image_target_for, BucketTarget};
pub use config::{DashboardConfig, PngOutput};
pub use orchestrator::{run_startup_pipeline, PipelineResult};
