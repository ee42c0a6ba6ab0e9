use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

use super::JsonSource;
use crate::error::FetchError;

// Both CDNs reject or throttle obvious non-browser clients.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Outbound HTTP client for the sports data feeds.
///
/// Sends browser-like headers, applies a per-request timeout and never
/// retries: a failed attempt is reported once and the caller decides how to
/// degrade.
#[derive(Clone)]
pub struct UpstreamClient {
    http: Client,
}

impl UpstreamClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert("upgrade-insecure-requests", HeaderValue::from_static("1"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(UpstreamClient { http })
    }
}

#[async_trait]
impl JsonSource for UpstreamClient {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(|source| {
            error!("Request failed for {}: {}", url, source);
            FetchError::Transport {
                url: url.to_string(),
                source,
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            error!("Request failed for {}: HTTP {}", url, status);
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // A body that is not JSON is a transport-level decode failure in
        // reqwest; report it as a parse problem instead.
        let bytes = resp.bytes().await.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::parse(url, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let client = UpstreamClient::new(Duration::from_millis(500)).unwrap();
        // Port 9 on localhost (discard) is closed on test machines.
        let err = client.get_json("http://127.0.0.1:9/feed.json").await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }), "got {:?}", err);
    }

    #[test]
    fn test_parse_error_names_source() {
        let err = FetchError::parse("https://example.test/x.json", "missing field");
        assert_eq!(
            err.to_string(),
            "unexpected payload from https://example.test/x.json: missing field"
        );
    }
}
