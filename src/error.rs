use thiserror::Error;

/// Failure talking to an upstream data provider.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection failure, timeout, or an unreadable body.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The upstream answered, but not with the shape we expect.
    #[error("unexpected payload from {source_name}: {reason}")]
    Parse { source_name: String, reason: String },
}

impl FetchError {
    pub fn parse(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        FetchError::Parse {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

/// Failure reading or writing the on-disk cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// No entry on disk, or the entry is not valid JSON.
    #[error("no cache entry for '{0}'")]
    NotFound(String),

    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode cache entry: {0}")]
    Encode(#[from] serde_json::Error),
}
