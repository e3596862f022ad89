//! The etcd sink: the principal backend. Owns one [`RefreshWorker`] per live
//! container and keeps the `id -> worker` map exclusively mutated from the
//! event-loop thread.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::Result;
use crate::lazy::LazyInfo;
use crate::projector::project;
use crate::refresher::RefreshWorker;
use crate::store::KvStore;

use super::Backend;

pub struct EtcdSink {
    config: Arc<Config>,
    store: Arc<dyn KvStore>,
    shutdown: CancellationToken,
    workers: DashMap<String, RefreshWorker>,
}

impl EtcdSink {
    pub fn new(config: Arc<Config>, store: Arc<dyn KvStore>, shutdown: CancellationToken) -> Self {
        Self {
            config,
            store,
            shutdown,
            workers: DashMap::new(),
        }
    }

    /// `start`/`running`: project, register the worker under `info.Id`
    /// *before* launching it, replacing (cancelling) any previous worker for
    /// the same id. Preserves "at most one worker per container id".
    async fn start(&self, info: &LazyInfo) -> Result<()> {
        let Some(record) = info.get().await else {
            return Ok(());
        };

        let Some(projection) = project(&record, &self.config) else {
            debug!(id = info.id(), "inspect record missing Id/Image, skipping projection");
            return Ok(());
        };

        let period = Duration::from_secs(self.config.refresh_period_secs);
        let entries = Arc::new(projection.entries);
        let worker = RefreshWorker::spawn(entries, self.store.clone(), period, &self.shutdown);

        if let Some((_, old)) = self.workers.remove(info.id()) {
            old.cancel();
        }
        self.workers.insert(info.id().to_string(), worker);

        Ok(())
    }

    /// `die`: cancel the worker and delete its subtree without waiting for
    /// the worker's next wake-up.
    async fn die(&self, info: &LazyInfo) -> Result<()> {
        let Some((_, worker)) = self.workers.remove(info.id()) else {
            warn!(id = info.id(), "die for container with no registered worker");
            return Ok(());
        };
        worker.cancel();

        // `die` supplies the last-known Config.Image, so inspection may
        // already be failing; but the prefix only needs the fields below,
        // which the runtime also reports on container records still visible
        // at `die` time. If inspection fails entirely, the prefix cannot be
        // recomputed and the subtree is left to expire via TTL.
        if let Some(record) = info.get().await {
            if let Some(projection) = project(&record, &self.config) {
                if let Err(e) = self.store.delete_prefix(&projection.prefix).await {
                    warn!(prefix = %projection.prefix, error = %e, "delete on die failed, relying on TTL expiry");
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Backend for EtcdSink {
    fn name(&self) -> &str {
        "etcd"
    }

    async fn handle(&self, status: &str, info: &LazyInfo) -> Result<()> {
        match status {
            "start" | "running" => self.start(info).await,
            "die" => self.die(info).await,
            _ => Ok(()),
        }
    }

    /// Drain every outstanding worker and wait up to `grace` for its current
    /// write pass to finish, instead of letting the process exit mid-write.
    async fn shutdown(&self, grace: Duration) {
        let ids: Vec<String> = self.workers.iter().map(|e| e.key().clone()).collect();
        let workers: Vec<RefreshWorker> = ids
            .into_iter()
            .filter_map(|id| self.workers.remove(&id).map(|(_, worker)| worker))
            .collect();

        if workers.is_empty() {
            return;
        }

        let joined = futures_util::future::join_all(workers.into_iter().map(RefreshWorker::join));
        if tokio::time::timeout(grace, joined).await.is_err() {
            warn!(grace_secs = grace.as_secs(), "refresh workers did not finish within the shutdown grace period");
        }
    }
}
