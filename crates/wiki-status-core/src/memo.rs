use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

/// Per-run cache for one kind of query, keyed by the query's arguments.
///
/// The cell for a key is created before the computation starts, so callers
/// arriving while it is still running wait for that result instead of
/// starting their own. Entries are never evicted.
pub struct Memo<K, V> {
    cells: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> Memo<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the stored value for `key`, computing it with `init` on first use.
    ///
    /// A failed computation is not stored; the next caller runs `init` again.
    pub async fn get_or_try_init<E, F, Fut>(&self, key: K, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cell = {
            let mut cells = self.cells.lock().await;
            Arc::clone(cells.entry(key).or_default())
        };
        cell.get_or_try_init(init).await.cloned()
    }

    /// Number of keys seen so far, finished or not.
    pub async fn len(&self) -> usize {
        self.cells.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_second_call_reuses_value() {
        let memo: Memo<String, usize> = Memo::new();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..3 {
            let value = memo
                .get_or_try_init("fr".to_string(), || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(42)
                })
                .await
                .unwrap();
            assert_eq!(value, 42);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(memo.len().await, 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_compute_separately() {
        let memo: Memo<&'static str, String> = Memo::new();
        let fr = memo
            .get_or_try_init("fr", || async { Ok::<_, ()>("fr".to_string()) })
            .await
            .unwrap();
        let de = memo
            .get_or_try_init("de", || async { Ok::<_, ()>("de".to_string()) })
            .await
            .unwrap();
        assert_eq!((fr.as_str(), de.as_str()), ("fr", "de"));
        assert_eq!(memo.len().await, 2);
    }

    #[tokio::test]
    async fn test_concurrent_calls_compute_once() {
        let memo: Memo<(), Arc<Vec<u32>>> = Memo::new();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let compute = || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, ()>(Arc::new(vec![1, 2, 3]))
        };

        let (a, b) = tokio::join!(
            memo.get_or_try_init((), compute),
            memo.get_or_try_init((), compute)
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let memo: Memo<u8, u8> = Memo::new();
        let first = memo.get_or_try_init(1, || async { Err::<u8, _>("boom") }).await;
        assert_eq!(first, Err("boom"));

        let second = memo.get_or_try_init(1, || async { Ok::<_, &str>(7) }).await;
        assert_eq!(second, Ok(7));
    }
}
