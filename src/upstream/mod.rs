pub mod client;

pub use client::UpstreamClient;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FetchError;

/// Anything that can answer a GET with a JSON document.
///
/// The production implementation is [`UpstreamClient`]; tests substitute an
/// in-memory source so provider logic runs without the network.
#[async_trait]
pub trait JsonSource: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError>;
}

#[cfg(test)]
pub mod fake {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Canned responses keyed by URL. Unknown URLs answer with HTTP 404.
    #[derive(Default)]
    pub struct FakeSource {
        responses: Mutex<HashMap<String, Value>>,
        calls: AtomicUsize,
    }

    impl FakeSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(self, url: &str, body: Value) -> Self {
            self.set(url, body);
            self
        }

        pub fn set(&self, url: &str, body: Value) {
            self.responses.lock().unwrap().insert(url.to_string(), body);
        }

        pub fn remove(&self, url: &str) {
            self.responses.lock().unwrap().remove(url);
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl JsonSource for FakeSource {
        async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }
}
