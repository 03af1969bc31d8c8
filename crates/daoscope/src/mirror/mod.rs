//! Mirror-node access: HTTP fetch, response cache, and query fan-out.

pub(crate) mod cache;
pub(crate) mod fetch;
pub mod orchestrator;

pub use cache::{CacheError, ResponseCache};
pub use orchestrator::{fetch_and_decode, fetch_and_decode_with_diagnostics};
pub use fetch::{FetchError, LogQuery, MirrorClient, MirrorConfig, RawLogRecord};
