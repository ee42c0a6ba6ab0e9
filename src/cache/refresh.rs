use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

use super::file_cache::{is_fresh, FileCache};
use crate::error::{CacheError, FetchError};
use crate::games::GameSummary;

/// Body returned by the game endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshResult {
    pub update_time: NaiveDateTime,
    pub games: Vec<GameSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Seconds this result stays fresh; overrides the endpoint default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_duration: Option<u64>,
}

impl RefreshResult {
    pub fn new(update_time: NaiveDateTime, games: Vec<GameSummary>) -> Self {
        RefreshResult {
            update_time,
            games,
            error: None,
            message: None,
            cache_duration: None,
        }
    }
}

/// How long a result may be served from cache.
#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    pub live: Duration,
    pub idle: Duration,
}

impl CachePolicy {
    /// Live games get the short duration. Otherwise the idle duration
    /// applies, cut down so the cache expires around the next tip-off or
    /// kick-off, but never below the live duration.
    pub fn duration_for(&self, live: bool, until_next_start: Option<Duration>) -> Duration {
        if live {
            return self.live;
        }
        match until_next_start {
            Some(d) => d.max(self.live).min(self.idle),
            None => self.idle,
        }
    }
}

/// Serves endpoint results from the file cache, refetching when stale and
/// degrading to stale data or an error envelope when the producer fails.
#[derive(Debug, Clone)]
pub struct Refresher {
    cache: FileCache,
}

impl Refresher {
    pub fn new(cache: FileCache) -> Self {
        Refresher { cache }
    }

    /// Drop the cached entry so the next refresh goes upstream.
    pub async fn invalidate(&self, endpoint: &str) {
        match self.cache.invalidate(endpoint).await {
            Ok(()) => info!("Invalidated cache for {}", endpoint),
            Err(e) => warn!("Failed to invalidate cache for {}: {}", endpoint, e),
        }
    }

    /// Return the cached payload for `endpoint` if fresh, else run
    /// `producer`. Never fails: producer errors fall back to the last cached
    /// payload of any age, then to `{"error": true, "message": ...}`.
    pub async fn refresh<T, F, Fut>(&self, endpoint: &str, duration: Duration, producer: F) -> Value
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        self.refresh_at(Utc::now(), endpoint, duration, producer).await
    }

    pub(crate) async fn refresh_at<T, F, Fut>(
        &self,
        now: DateTime<Utc>,
        endpoint: &str,
        duration: Duration,
        producer: F,
    ) -> Value
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        match self.cache.get(endpoint).await {
            Ok(entry) => {
                let effective = stored_duration(&entry.payload).unwrap_or(duration);
                if is_fresh(entry.age(now), effective) {
                    info!("Using cached data for {}", entry.key);
                    return entry.payload;
                }
            }
            Err(CacheError::NotFound(_)) => {}
            Err(e) => warn!("Cache read error for {}: {}", endpoint, e),
        }

        info!("Fetching fresh data for {}", endpoint);
        let failure = match producer().await {
            Ok(result) => match serde_json::to_value(&result) {
                Ok(payload) => {
                    if let Err(e) = self.cache.put(endpoint, &payload).await {
                        warn!("Failed to write cache for {}: {}", endpoint, e);
                    }
                    return payload;
                }
                Err(e) => e.to_string(),
            },
            Err(e) => e.to_string(),
        };

        error!("Error fetching fresh data for {}: {}", endpoint, failure);

        match self.cache.get(endpoint).await {
            Ok(entry) => {
                info!("Using expired cache as fallback for {}", endpoint);
                entry.payload
            }
            Err(e) => {
                warn!("No fallback cache for {}: {}", endpoint, e);
                error_envelope(&failure)
            }
        }
    }
}

fn stored_duration(payload: &Value) -> Option<Duration> {
    payload
        .get("cache_duration")
        .and_then(Value::as_u64)
        .map(Duration::from_secs)
}

fn error_envelope(message: &str) -> Value {
    json!({ "error": true, "message": message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::file_cache::tests::{backdate, temp_cache};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const MINUTE: Duration = Duration::from_secs(60);

    fn failing() -> Result<Value, FetchError> {
        Err(FetchError::Status {
            url: "https://cdn.example.test/schedule.json".into(),
            status: 503,
        })
    }

    #[tokio::test]
    async fn test_fresh_entry_skips_producer() {
        let (cache, _dir) = temp_cache();
        let refresher = Refresher::new(cache.clone());
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..2 {
            let out = refresher
                .refresh("rockets_games", 2 * MINUTE, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, FetchError>(json!({"games": [1]}))
                })
                .await;
            assert_eq!(out, json!({"games": [1]}));
        }

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_entry_is_refetched_and_rewritten() {
        let (cache, _dir) = temp_cache();
        cache.put("k", &json!({"v": "old"})).await.unwrap();
        backdate(&cache, "k", 10 * MINUTE);

        let out = Refresher::new(cache.clone())
            .refresh("k", 2 * MINUTE, || async {
                Ok::<_, FetchError>(json!({"v": "new"}))
            })
            .await;

        assert_eq!(out, json!({"v": "new"}));
        assert_eq!(cache.get("k").await.unwrap().payload, json!({"v": "new"}));
    }

    #[tokio::test]
    async fn test_failing_producer_falls_back_to_stale_entry() {
        let (cache, _dir) = temp_cache();
        let stale = json!({"update_time": "2025-01-01T10:00:00", "games": [{"game_id": "1"}]});
        cache.put("k", &stale).await.unwrap();
        backdate(&cache, "k", 60 * MINUTE);

        let out = Refresher::new(cache)
            .refresh("k", 2 * MINUTE, || async { failing() })
            .await;

        assert_eq!(out, stale);
    }

    #[tokio::test]
    async fn test_failing_producer_without_cache_returns_error_envelope() {
        let (cache, _dir) = temp_cache();

        let out = Refresher::new(cache.clone())
            .refresh("k", 2 * MINUTE, || async { failing() })
            .await;

        assert_eq!(out["error"], json!(true));
        let message = out["message"].as_str().unwrap();
        assert!(message.contains("503"), "message was {:?}", message);
        // Nothing is persisted for a failed fetch.
        assert!(matches!(cache.get("k").await, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let (cache, _dir) = temp_cache();
        cache.ensure_dir().await.unwrap();
        std::fs::write(cache.dir().join("k.json"), b"\x00\x01garbage").unwrap();

        let out = Refresher::new(cache.clone())
            .refresh("k", 2 * MINUTE, || async {
                Ok::<_, FetchError>(json!({"v": 1}))
            })
            .await;

        assert_eq!(out, json!({"v": 1}));
        assert_eq!(cache.get("k").await.unwrap().payload, json!({"v": 1}));
    }

    #[tokio::test]
    async fn test_stored_cache_duration_overrides_default() {
        let (cache, _dir) = temp_cache();
        cache
            .put("k", &json!({"v": "cached", "cache_duration": 3600}))
            .await
            .unwrap();
        backdate(&cache, "k", 10 * MINUTE);

        // Ten minutes old: stale under a 2 minute default, fresh under the
        // stored hour.
        let out = Refresher::new(cache)
            .refresh("k", 2 * MINUTE, || async {
                Ok::<_, FetchError>(json!({"v": "fetched"}))
            })
            .await;

        assert_eq!(out["v"], json!("cached"));
    }

    #[tokio::test]
    async fn test_boundary_age_is_stale() {
        let (cache, _dir) = temp_cache();
        cache.put("k", &json!({"v": "cached"})).await.unwrap();
        let written_at = cache.get("k").await.unwrap().written_at;

        let out = Refresher::new(cache)
            .refresh_at(
                written_at + chrono::Duration::seconds(120),
                "k",
                2 * MINUTE,
                || async { Ok::<_, FetchError>(json!({"v": "fetched"})) },
            )
            .await;

        assert_eq!(out["v"], json!("fetched"));
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let (cache, _dir) = temp_cache();
        let refresher = Refresher::new(cache);
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let produce = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, FetchError>(json!({"games": []}))
        };

        refresher.refresh("k", 2 * MINUTE, produce).await;
        refresher.invalidate("k").await;
        refresher.refresh("k", 2 * MINUTE, produce).await;

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_policy_live_uses_short_duration() {
        let policy = CachePolicy { live: Duration::from_secs(30), idle: Duration::from_secs(3600) };
        assert_eq!(policy.duration_for(true, Some(Duration::from_secs(10))), Duration::from_secs(30));
    }

    #[test]
    fn test_policy_idle_capped_by_next_start() {
        let policy = CachePolicy { live: Duration::from_secs(120), idle: Duration::from_secs(3600) };
        assert_eq!(policy.duration_for(false, None), Duration::from_secs(3600));
        assert_eq!(
            policy.duration_for(false, Some(Duration::from_secs(900))),
            Duration::from_secs(900)
        );
        assert_eq!(
            policy.duration_for(false, Some(Duration::from_secs(5))),
            Duration::from_secs(120)
        );
        assert_eq!(
            policy.duration_for(false, Some(Duration::from_secs(86_400))),
            Duration::from_secs(3600)
        );
    }
}
