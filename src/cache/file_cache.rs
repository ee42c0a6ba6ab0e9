use chrono::{DateTime, Utc};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::CacheError;

/// Distinguishes temp files of concurrent writers within this process.
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// A cached payload together with the time it was written.
#[derive(Debug, Clone)]
pub struct CachedEntry {
    pub key: String,
    pub payload: Value,
    pub written_at: DateTime<Utc>,
}

impl CachedEntry {
    /// Age relative to `now`. An mtime in the future counts as age zero.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.written_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

/// `true` while `age` is strictly below `duration`.
pub fn is_fresh(age: Duration, duration: Duration) -> bool {
    age < duration
}

/// File-per-key JSON cache rooted at a fixed directory.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileCache { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the cache directory (and parents) if missing.
    pub async fn ensure_dir(&self) -> Result<(), CacheError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Read an entry regardless of age.
    ///
    /// A missing file and a file that is not valid JSON both come back as
    /// [`CacheError::NotFound`].
    pub async fn get(&self, key: &str) -> Result<CachedEntry, CacheError> {
        let path = self.path(key);

        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CacheError::NotFound(key.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let modified = tokio::fs::metadata(&path).await?.modified()?;

        let payload: Value = match serde_json::from_slice(&bytes) {
            Ok(v) => v,
            Err(e) => {
                warn!("Cache read error for {}: {}", key, e);
                return Err(CacheError::NotFound(key.to_string()));
            }
        };

        Ok(CachedEntry {
            key: key.to_string(),
            payload,
            written_at: DateTime::<Utc>::from(modified),
        })
    }

    /// Overwrite the entry for `key`.
    ///
    /// The payload goes to a temp file in the same directory first and is
    /// then renamed over the target, so readers see either the old or the
    /// new document, never a torn one.
    pub async fn put(&self, key: &str, payload: &Value) -> Result<(), CacheError> {
        self.ensure_dir().await?;

        let body = serde_json::to_vec(payload)?;
        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = self
            .dir
            .join(format!(".{}.{}.{}.tmp", key, std::process::id(), seq));

        tokio::fs::write(&tmp, &body).await?;
        if let Err(e) = tokio::fs::rename(&tmp, self.path(key)).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        debug!("Cached {} ({} bytes)", key, body.len());
        Ok(())
    }

    /// Delete the entry for `key`. Deleting a missing entry is not an error.
    pub async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        match tokio::fs::remove_file(self.path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use std::time::SystemTime;
    use tempfile::TempDir;

    pub(crate) fn temp_cache() -> (FileCache, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        (FileCache::new(dir.path().join("cache")), dir)
    }

    /// Push an entry's mtime into the past.
    pub(crate) fn backdate(cache: &FileCache, key: &str, by: Duration) {
        let file = std::fs::File::options()
            .write(true)
            .open(cache.path(key))
            .expect("open cache file");
        file.set_modified(SystemTime::now() - by)
            .expect("set mtime");
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let (cache, _dir) = temp_cache();
        let err = cache.get("rockets_games").await.unwrap_err();
        assert!(matches!(err, CacheError::NotFound(k) if k == "rockets_games"));
    }

    #[tokio::test]
    async fn test_put_creates_directory_and_round_trips() {
        let (cache, _dir) = temp_cache();
        let payload = json!({"games": [], "update_time": "2025-01-01T10:00:00"});

        cache.put("arsenal_games", &payload).await.unwrap();

        assert!(cache.dir().join("arsenal_games.json").exists());
        let entry = cache.get("arsenal_games").await.unwrap();
        assert_eq!(entry.payload, payload);
        assert!(entry.age(Utc::now()) < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_put_leaves_no_temp_files() {
        let (cache, _dir) = temp_cache();
        cache.put("k", &json!({"a": 1})).await.unwrap();
        cache.put("k", &json!({"a": 2})).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(cache.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["k.json".to_string()]);
        assert_eq!(cache.get("k").await.unwrap().payload, json!({"a": 2}));
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_as_not_found_and_can_be_overwritten() {
        let (cache, _dir) = temp_cache();
        cache.ensure_dir().await.unwrap();
        std::fs::write(cache.dir().join("k.json"), b"{not json").unwrap();

        assert!(matches!(
            cache.get("k").await.unwrap_err(),
            CacheError::NotFound(_)
        ));

        cache.put("k", &json!({"ok": true})).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().payload, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_invalidate_removes_and_tolerates_missing() {
        let (cache, _dir) = temp_cache();
        cache.put("k", &json!(1)).await.unwrap();

        cache.invalidate("k").await.unwrap();
        assert!(matches!(cache.get("k").await, Err(CacheError::NotFound(_))));

        // Second delete is a no-op, as is deleting in a missing directory.
        cache.invalidate("k").await.unwrap();
        FileCache::new("/nonexistent/startpage-cache")
            .invalidate("k")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_age_follows_mtime() {
        let (cache, _dir) = temp_cache();
        cache.put("k", &json!(1)).await.unwrap();
        backdate(&cache, "k", Duration::from_secs(600));

        let age = cache.get("k").await.unwrap().age(Utc::now());
        assert!(age >= Duration::from_secs(599), "age was {:?}", age);
        assert!(age < Duration::from_secs(700), "age was {:?}", age);
    }

    #[test]
    fn test_is_fresh_is_strict() {
        let d = Duration::from_secs(120);
        assert!(is_fresh(Duration::from_secs(119), d));
        assert!(!is_fresh(Duration::from_secs(120), d));
        assert!(!is_fresh(Duration::from_secs(121), d));
        assert!(is_fresh(Duration::ZERO, d));
    }

    #[test]
    fn test_future_mtime_counts_as_zero_age() {
        let entry = CachedEntry {
            key: "k".into(),
            payload: json!(null),
            written_at: Utc::now() + chrono::Duration::seconds(30),
        };
        assert_eq!(entry.age(Utc::now()), Duration::ZERO);
    }
}
