/// Read-through caching over [`Cache`](crate::db::Cache).
///
/// Returns the cached value when present. Otherwise awaits `$block`, queues the
/// result for a background write and returns it. A failed cache read counts as
/// a miss, so an unreachable Redis never hides the underlying lookup.
///
/// # Arguments
/// * `$cache`: anything with `get_from_cache` and `set_in_background`.
/// * `$key`: the [`CacheKey`](crate::db::CacheKey) to read and write.
/// * `$ttl`: time-to-live of a freshly written value, in seconds.
/// * `$block`: future producing an `AppResult` on a miss. Errors are returned
///   and never cached.
///
/// # Example
/// ```rust,ignore
/// let url: String = cached!(cache, CacheKey::Poster(603), 3600, async move {
///     fetch_poster(603).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await {
            Ok(Some(cached)) => Ok(cached),
            lookup => {
                if let Err(e) = lookup {
                    tracing::warn!(error = %e, key = %key, "Cache read failed, treating as miss");
                }
                match $block.await {
                    Ok(value) => {
                        $cache.set_in_background(&key, &value, $ttl);
                        Ok(value)
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }};
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::db::CacheKey;
    use crate::error::{AppError, AppResult};

    /// In-memory stand-in exposing the two methods `cached!` calls
    #[derive(Default)]
    struct MemoryCache {
        entries: Mutex<HashMap<String, String>>,
        unreachable: bool,
    }

    impl MemoryCache {
        async fn get_from_cache<T: serde::de::DeserializeOwned>(
            &self,
            key: &CacheKey,
        ) -> AppResult<Option<T>> {
            if self.unreachable {
                return Err(AppError::Internal("connection refused".to_string()));
            }
            let entries = self.entries.lock().unwrap();
            entries
                .get(&key.to_string())
                .map(|json| serde_json::from_str(json))
                .transpose()
                .map_err(|e| AppError::Internal(e.to_string()))
        }

        fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, _ttl: u64) {
            let json = serde_json::to_string(value).unwrap();
            self.entries.lock().unwrap().insert(key.to_string(), json);
        }

        fn stored(&self, key: &CacheKey) -> Option<String> {
            self.entries.lock().unwrap().get(&key.to_string()).cloned()
        }
    }

    async fn poster(
        cache: &MemoryCache,
        movie_id: i64,
        fetches: &AtomicUsize,
        url: &str,
    ) -> AppResult<String> {
        cached!(cache, CacheKey::Poster(movie_id), 60, async {
            fetches.fetch_add(1, Ordering::SeqCst);
            Ok::<_, AppError>(url.to_string())
        })
    }

    #[tokio::test]
    async fn test_hit_skips_lookup() {
        let cache = MemoryCache::default();
        cache.set_in_background(&CacheKey::Poster(603), &"https://img/cached.jpg", 60);
        let fetches = AtomicUsize::new(0);

        let url = poster(&cache, 603, &fetches, "https://img/fresh.jpg").await.unwrap();

        assert_eq!(url, "https://img/cached.jpg");
        assert_eq!(fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_miss_runs_lookup_and_stores_result() {
        let cache = MemoryCache::default();
        let fetches = AtomicUsize::new(0);

        let first = poster(&cache, 27205, &fetches, "https://img/inception.jpg").await.unwrap();
        let second = poster(&cache, 27205, &fetches, "https://img/other.jpg").await.unwrap();

        assert_eq!(first, "https://img/inception.jpg");
        assert_eq!(second, "https://img/inception.jpg");
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_lookup_is_not_stored() {
        let cache = MemoryCache::default();

        let result: AppResult<String> = cached!(cache, CacheKey::Poster(1), 60, async {
            Err::<String, _>(AppError::ExternalApi("tmdb returned 500".to_string()))
        });

        assert!(matches!(result, Err(AppError::ExternalApi(_))));
        assert_eq!(cache.stored(&CacheKey::Poster(1)), None);
    }

    #[tokio::test]
    async fn test_read_failure_counts_as_miss() {
        let cache = MemoryCache {
            unreachable: true,
            ..Default::default()
        };
        let fetches = AtomicUsize::new(0);

        let url = poster(&cache, 155, &fetches, "https://img/knight.jpg").await.unwrap();

        assert_eq!(url, "https://img/knight.jpg");
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }
}
