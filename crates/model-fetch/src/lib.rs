//! Model download engine with a single background worker and whole-file caching
//!
//! Provides asset acquisition for the viewer with:
//! - Streaming downloads into a `.tmp` sibling, renamed atomically on completion
//! - Unconditional reuse of complete cache entries (no freshness check)
//! - Bounded-chunk reads for local paths and opaque content handles
//! - Exactly one result message per accepted request, delivered asynchronously
//!   to the submitting thread's channel

mod cache;
mod fetcher;
mod worker;

pub mod coordinator;
pub mod types;

pub use cache::ModelCache;
pub use coordinator::TransferCoordinator;
pub use types::{
    derived_filename, DownloadProgress, FetchedModel, ModelSource, ProgressSink, ResultSink,
    TransferResult,
};
