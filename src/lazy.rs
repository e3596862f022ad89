//! Lazy, memoized container inspection.
//!
//! One [`LazyInfo`] is created per event and shared (cloned) across every
//! backend dispatched to for that event; inspection happens at most once,
//! on whichever backend accesses it first.

use std::sync::Arc;

use bollard::models::ContainerInspectResponse;
use tokio::sync::OnceCell;
use tracing::warn;

use crate::docker::RuntimeClient;

#[derive(Clone)]
pub struct LazyInfo {
    client: Option<RuntimeClient>,
    id: String,
    cell: Arc<OnceCell<Option<Arc<ContainerInspectResponse>>>>,
}

impl LazyInfo {
    pub fn new(client: RuntimeClient, id: String) -> Self {
        Self {
            client: Some(client),
            id,
            cell: Arc::new(OnceCell::new()),
        }
    }

    /// A [`LazyInfo`] that resolves to a fixed record without ever talking
    /// to a runtime client. Used by backend tests that don't exercise
    /// inspection itself.
    #[cfg(test)]
    pub fn new_for_test(id: &str, info: Option<ContainerInspectResponse>) -> Self {
        let cell = OnceCell::new();
        cell.set(info.map(Arc::new)).ok();
        Self {
            client: None,
            id: id.to_string(),
            cell: Arc::new(cell),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Materialize the inspect result, memoizing it. `None` means
    /// inspection failed (already-gone, permissions, …) — the record is
    /// treated as absent.
    pub async fn get(&self) -> Option<Arc<ContainerInspectResponse>> {
        let client = self.client.clone();
        let id = self.id.clone();
        self.cell
            .get_or_init(|| async move {
                let client = client.expect("LazyInfo::get called without a runtime client");
                match client.inspect(&id).await {
                    Ok(info) => Some(Arc::new(info)),
                    Err(e) => {
                        warn!(id = %id, error = %e, "inspection failed, dropping event");
                        None
                    }
                }
            })
            .await
            .clone()
    }
}
