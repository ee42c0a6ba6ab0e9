//! On-disk response cache and the refresh policy built on top of it.
//!
//! Each endpoint key maps to one JSON file under the cache directory. The
//! file's modification time is the freshness clock; there is no sidecar
//! metadata.

pub(crate) mod file_cache;
mod refresh;

pub use file_cache::FileCache;
pub use refresh::{CachePolicy, RefreshResult, Refresher};
