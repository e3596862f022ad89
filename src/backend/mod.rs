//! Backend registry: an ordered, per-name-enableable collection of lifecycle
//! sinks. The etcd sink is the principal backend; additional backends (e.g.
//! the debug log sink) can be added without touching the event loop.

mod etcd_sink;
mod log_sink;

pub use etcd_sink::EtcdSink;
pub use log_sink::LogSink;

use std::time::Duration;

use async_trait::async_trait;
use tracing::error;

use crate::config::Config;
use crate::error::Result;
use crate::lazy::LazyInfo;

/// A named lifecycle sink.
///
/// Dispatch is an explicit capability: a backend's `handle` decides which
/// statuses it cares about and returns `Ok(())` for everything else, which
/// models the source's "named handler, else catch-all, else skip" lookup
/// without runtime reflection.
#[async_trait]
pub trait Backend: Send + Sync {
    fn name(&self) -> &str;

    async fn handle(&self, status: &str, info: &LazyInfo) -> Result<()>;

    /// Wait up to `grace` for any work in flight to finish. The default is a
    /// no-op; backends that own background tasks (the etcd sink's refresh
    /// workers) override this.
    async fn shutdown(&self, _grace: Duration) {}
}

/// Declarative backend registration plus per-name enable/disable override.
pub struct Registration {
    pub backend: Box<dyn Backend>,
    pub default_enabled: bool,
}

/// Process-wide, explicitly constructed registry of enabled backends.
pub struct Registry {
    active: Vec<Box<dyn Backend>>,
}

impl Registry {
    /// Build the active set: only backends whose `REGISTRATOR_<NAME>`
    /// override (or `default_enabled`) resolves truthy enter the registry.
    /// Registration order carries no dispatch-ordering guarantee across
    /// backends.
    pub fn new(registrations: Vec<Registration>) -> Self {
        let active = registrations
            .into_iter()
            .filter(|r| Config::backend_enabled(r.backend.name(), r.default_enabled))
            .map(|r| r.backend)
            .collect();
        Self { active }
    }

    /// Dispatch `(status, info)` to every enabled backend. A backend
    /// failure is isolated: logged with backend identity and status, never
    /// interrupting dispatch to the rest of the backends or to future
    /// events.
    pub async fn dispatch(&self, status: &str, info: &LazyInfo) {
        for backend in &self.active {
            if let Err(e) = backend.handle(status, info).await {
                error!(backend = backend.name(), status, error = %e, "backend dispatch failed");
            }
        }
    }

    /// Give every backend up to `grace` to finish work in flight, e.g. after
    /// the process-wide shutdown token has been cancelled.
    pub async fn shutdown(&self, grace: Duration) {
        for backend in &self.active {
            backend.shutdown(grace).await;
        }
    }
}
