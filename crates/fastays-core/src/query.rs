//! Query result caching with a process-wide retry and staleness policy.
//!
//! A `QueryClient` is created once at startup from `QueryConfig` and shared
//! by everything that reads server data. Results are cached as JSON and
//! served without a network call while fresh (5 minutes by default).
//! Retryable failures are retried with exponential backoff.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::api::ApiError;

/// Initial backoff delay in milliseconds between query retries.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Upper bound on a single backoff delay.
const MAX_BACKOFF_MS: u64 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Extra attempts after a retryable failure
    pub retry: u32,
    /// Minutes a cached result is served without refetching
    pub stale_minutes: i64,
    /// Minutes after which a cached result is dropped entirely
    pub gc_minutes: i64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            retry: 2,
            stale_minutes: 5,
            gc_minutes: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    fn is_older_than(&self, minutes: i64) -> bool {
        Utc::now() - self.cached_at >= chrono::Duration::minutes(minutes)
    }
}

/// Human-readable age of a timestamp ("just now", "5m ago", "2h ago").
pub fn age_display(at: DateTime<Utc>) -> String {
    let minutes = (Utc::now() - at).num_minutes();
    if minutes < 1 {
        // Also covers clock skew
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        if minutes % 60 >= 30 {
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        format!("{}d ago", minutes / 1440)
    }
}

pub struct QueryClient {
    config: QueryConfig,
    entries: Mutex<HashMap<String, CachedData<serde_json::Value>>>,
}

impl QueryClient {
    pub fn new(config: QueryConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Return the cached result for `key` if fresh, otherwise run `fetcher`.
    pub async fn fetch<T, F, Fut>(&self, key: &str, fetcher: F) -> Result<T, ApiError>
    where
        T: Serialize + DeserializeOwned,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if let Some(value) = self.fresh(key).await {
            match serde_json::from_value(value) {
                Ok(data) => {
                    debug!(key, "Query served from cache");
                    return Ok(data);
                }
                Err(e) => warn!(key, error = %e, "Cached query result has unexpected shape"),
            }
        }

        let data = self.fetch_with_retry(key, fetcher).await?;

        match serde_json::to_value(&data) {
            Ok(value) => {
                self.entries
                    .lock()
                    .await
                    .insert(key.to_string(), CachedData::new(value));
            }
            Err(e) => warn!(key, error = %e, "Query result not cacheable"),
        }
        Ok(data)
    }

    async fn fresh(&self, key: &str) -> Option<serde_json::Value> {
        let mut entries = self.entries.lock().await;
        let gc_minutes = self.config.gc_minutes;
        entries.retain(|_, cached| !cached.is_older_than(gc_minutes));
        entries
            .get(key)
            .filter(|cached| !cached.is_older_than(self.config.stale_minutes))
            .map(|cached| cached.data.clone())
    }

    async fn fetch_with_retry<T, F, Fut>(&self, key: &str, fetcher: F) -> Result<T, ApiError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            match fetcher().await {
                Ok(data) => return Ok(data),
                Err(e) if e.is_retryable() && attempt < self.config.retry => {
                    attempt += 1;
                    warn!(key, retry = attempt, backoff_ms, error = %e, "Query failed, retrying");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Force the next `fetch` for `key` to hit the network
    pub async fn invalidate(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn cached_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.entries.lock().await.get(key).map(|c| c.cached_at)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_fresh_result_is_served_from_cache() {
        let client = QueryClient::new(QueryConfig::default());
        let calls = AtomicU32::new(0);

        for _ in 0..3 {
            let value: u32 = client
                .fetch("homeData", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await
                .unwrap();
            assert_eq!(value, 7);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(client.cached_at("homeData").await.is_some());
    }

    #[tokio::test]
    async fn test_zero_stale_window_always_refetches() {
        let client = QueryClient::new(QueryConfig {
            stale_minutes: 0,
            ..QueryConfig::default()
        });
        let calls = AtomicU32::new(0);

        for _ in 0..2 {
            let _: u32 = client
                .fetch("homeData", || async { Ok(calls.fetch_add(1, Ordering::SeqCst)) })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let client = QueryClient::new(QueryConfig::default());
        let calls = AtomicU32::new(0);
        let fetch = || async { Ok::<u32, ApiError>(calls.fetch_add(1, Ordering::SeqCst)) };

        assert_eq!(client.fetch("k", fetch).await.unwrap(), 0);
        client.invalidate("k").await;
        assert_eq!(client.fetch("k", fetch).await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retryable_failures_are_retried() {
        let client = QueryClient::new(QueryConfig::default());
        let calls = AtomicU32::new(0);

        let value: String = client
            .fetch("homeData", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ApiError::NoConnectivity)
                } else {
                    Ok("ok".to_string())
                }
            })
            .await
            .expect("third attempt should succeed");

        assert_eq!(value, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_are_bounded() {
        let client = QueryClient::new(QueryConfig::default());
        let calls = AtomicU32::new(0);

        let err = client
            .fetch::<u32, _, _>("homeData", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::Server {
                    status: 503,
                    message: "Service unavailable".to_string(),
                })
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Service unavailable");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(client.cached_at("homeData").await.is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_is_not_retried() {
        let client = QueryClient::new(QueryConfig::default());
        let calls = AtomicU32::new(0);

        let err = client
            .fetch::<u32, _, _>("homeData", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::Unauthorized("Token expired".to_string()))
            })
            .await
            .unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_entry_left_after_unauthorized_is_never_served() {
        let client = QueryClient::new(QueryConfig {
            stale_minutes: 0,
            ..QueryConfig::default()
        });
        let calls = AtomicU32::new(0);
        let fetch = || async {
            match calls.fetch_add(1, Ordering::SeqCst) {
                1 => Err(ApiError::Unauthorized("Token expired".to_string())),
                n => Ok::<u32, ApiError>(n),
            }
        };

        assert_eq!(client.fetch("homeData", fetch).await.unwrap(), 0);
        assert!(client.fetch("homeData", fetch).await.unwrap_err().is_unauthorized());
        // The old entry is still stored but stale, so signing back in refetches
        assert!(client.cached_at("homeData").await.is_some());
        assert_eq!(client.fetch("homeData", fetch).await.unwrap(), 2);
    }

    #[test]
    fn test_age_display() {
        let now = Utc::now();
        assert_eq!(age_display(now), "just now");
        assert_eq!(age_display(now + chrono::Duration::minutes(5)), "just now");
        assert_eq!(age_display(now - chrono::Duration::minutes(5)), "5m ago");
        assert_eq!(age_display(now - chrono::Duration::minutes(90)), "2h ago");
        assert_eq!(age_display(now - chrono::Duration::minutes(3 * 1440)), "3d ago");
    }
}
