//! etcd v3 backed [`KvStore`].
//!
//! The v3 KV API's `put` is an unconditional create-or-update, so there is
//! no `prevExists`-style conditional write to reason about here.

use std::time::Duration;

use async_trait::async_trait;
use etcd_client::{Client, DeleteOptions, PutOptions};
use tokio::time::timeout;
use tracing::debug;

use crate::error::{RegistratorError, Result};

use super::KvStore;

/// Calls that exceed this deadline surface as a logged failure rather than
/// hanging the caller indefinitely.
const CALL_DEADLINE: Duration = Duration::from_secs(10);

pub struct EtcdStore {
    client: Client,
}

impl EtcdStore {
    pub async fn connect(endpoint: &str) -> Result<Self> {
        let client = Client::connect([endpoint], None)
            .await
            .map_err(RegistratorError::from)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl KvStore for EtcdStore {
    async fn write(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let mut client = self.client.clone();
        timeout(CALL_DEADLINE, async move {
            let lease = client.lease_grant(ttl_secs as i64, None).await?;
            let options = PutOptions::new().with_lease(lease.id());
            client.put(key, value, Some(options)).await?;
            debug!(key, value, ttl_secs, "wrote key");
            Ok::<_, etcd_client::Error>(())
        })
        .await
        .map_err(|_| RegistratorError::Internal(format!("write to {key} timed out")))??;
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<()> {
        let mut client = self.client.clone();
        let prefix = prefix.to_string();
        timeout(CALL_DEADLINE, async move {
            client
                .delete(prefix.as_str(), Some(DeleteOptions::new().with_prefix()))
                .await?;
            debug!(prefix, "deleted subtree");
            Ok::<_, etcd_client::Error>(())
        })
        .await
        .map_err(|_| RegistratorError::Internal(format!("delete of {prefix} timed out")))??;
        Ok(())
    }
}
