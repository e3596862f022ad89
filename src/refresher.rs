//! One refresh worker per live container: owns its projection, writes it
//! with a TTL immediately, then every `period` until cancelled.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::store::KvStore;

/// A running (or stopped) refresh task for one container.
///
/// Cloning the cancellation flag and calling `cancel()` is enough to stop
/// the underlying task for a single container's `die`, without waiting on
/// it. The task's [`JoinHandle`] is kept too, so a caller that needs to wait
/// for every worker to actually finish (a bounded shutdown grace period) can
/// do so with [`RefreshWorker::join`].
pub struct RefreshWorker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RefreshWorker {
    /// Spawn a worker that writes `entries` to `store` every `period`, with
    /// TTL `2 * period`. `shutdown` is the process-wide cancellation source;
    /// the worker also stops if `shutdown` fires.
    pub fn spawn(
        entries: Arc<BTreeMap<String, String>>,
        store: Arc<dyn KvStore>,
        period: Duration,
        shutdown: &CancellationToken,
    ) -> Self {
        let cancel = shutdown.child_token();
        let task_cancel = cancel.clone();
        let ttl_secs = period.as_secs() * 2;

        let handle = tokio::spawn(async move {
            loop {
                write_pass(&store, &entries, ttl_secs).await;
                tokio::select! {
                    _ = task_cancel.cancelled() => return,
                    _ = tokio::time::sleep(period) => {}
                }
            }
        });

        Self { cancel, handle }
    }

    /// Request the worker to stop. It observes this at its next wake-up; the
    /// call itself never blocks on the worker's actual termination.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Consume the worker, waiting for its task to actually finish. Used at
    /// shutdown to give an in-flight write a bounded grace period instead of
    /// dropping it mid-call.
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            warn!(error = %e, "refresh worker task panicked");
        }
    }
}

async fn write_pass(store: &Arc<dyn KvStore>, entries: &BTreeMap<String, String>, ttl_secs: u64) {
    for (key, value) in entries {
        if let Err(e) = store.write(key, value, ttl_secs).await {
            warn!(key, error = %e, "refresh write failed, will retry next cycle");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::error::Result;

    #[derive(Default)]
    struct CountingStore {
        writes: AtomicUsize,
        seen_ttls: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl KvStore for CountingStore {
        async fn write(&self, _key: &str, _value: &str, ttl_secs: u64) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.seen_ttls.lock().unwrap().push(ttl_secs);
            Ok(())
        }

        async fn delete_prefix(&self, _prefix: &str) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_pass_runs_immediately_and_ttl_is_twice_the_period() {
        let store = Arc::new(CountingStore::default());
        let mut entries = BTreeMap::new();
        entries.insert("k".to_string(), "v".to_string());
        let shutdown = CancellationToken::new();

        let _worker = RefreshWorker::spawn(
            Arc::new(entries),
            store.clone(),
            Duration::from_secs(300),
            &shutdown,
        );

        tokio::task::yield_now().await;
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
        assert_eq!(store.seen_ttls.lock().unwrap().as_slice(), &[600]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_further_refresh_cycles() {
        let store = Arc::new(CountingStore::default());
        let entries = Arc::new(BTreeMap::from([("k".to_string(), "v".to_string())]));
        let shutdown = CancellationToken::new();

        let worker = RefreshWorker::spawn(entries, store.clone(), Duration::from_secs(10), &shutdown);
        tokio::task::yield_now().await;
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);

        worker.cancel();
        tokio::time::advance(Duration::from_secs(30)).await;
        tokio::task::yield_now().await;

        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shared_shutdown_token_stops_the_worker_too() {
        let store = Arc::new(CountingStore::default());
        let entries = Arc::new(BTreeMap::from([("k".to_string(), "v".to_string())]));
        let shutdown = CancellationToken::new();

        let _worker = RefreshWorker::spawn(entries, store.clone(), Duration::from_secs(10), &shutdown);
        tokio::task::yield_now().await;
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);

        shutdown.cancel();
        tokio::time::advance(Duration::from_secs(30)).await;
        tokio::task::yield_now().await;

        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    }
}
