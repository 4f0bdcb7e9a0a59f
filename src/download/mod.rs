//! Bulk image download pipeline: tasks, the per-asset fetcher and the
//! coordinator that runs a category batch with bounded parallelism.

pub mod coordinator;
pub mod fetcher;
pub mod outcome;
pub mod pipeline;
pub mod task;

pub use coordinator::{Coordinator, DEFAULT_CONCURRENCY};
pub use fetcher::HttpAssetFetcher;
pub use outcome::Summary;
pub use pipeline::download_all;
