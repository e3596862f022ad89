//! Debug-only catch-all backend, disabled by default. Mirrors the source's
//! `Log` backend: it has no named handlers, only a default that logs every
//! status it is dispatched.

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::lazy::LazyInfo;

use super::Backend;

pub struct LogSink;

#[async_trait]
impl Backend for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn handle(&self, status: &str, info: &LazyInfo) -> Result<()> {
        debug!(id = info.id(), status, "docker event");
        Ok(())
    }
}
