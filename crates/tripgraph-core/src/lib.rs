pub mod config;
pub mod error;
pub mod graph;
pub mod pipeline;
pub mod retry;
pub mod source;
pub mod transform;
pub mod writer;
pub mod zones;

pub use config::{LoaderConfig, StoreSettings};
pub use error::{LoaderError, Result};
pub use pipeline::{load_frame, run_once, run_with_retry, LoadSummary, Stage};
pub use retry::{RetryError, RetryPolicy};
pub use transform::TripRecord;
pub use zones::ZoneFilter;
