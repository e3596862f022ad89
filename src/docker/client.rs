//! Thin wrapper around the Docker SDK: list running containers, inspect one,
//! and stream lifecycle events. Isolates the rest of the bridge from
//! `bollard`'s own types wherever the data model in [`crate::docker::event`]
//! is enough.

use std::collections::HashMap;

use bollard::container::ListContainersOptions;
use bollard::models::ContainerInspectResponse;
use bollard::system::EventsOptions;
use bollard::Docker;
use futures_util::stream::{Stream, StreamExt};

use crate::error::{RegistratorError, Result};

use super::event::ContainerEvent;

/// Container runtime client. Cheap to clone: `bollard::Docker` is an `Arc` handle
/// internally.
#[derive(Clone)]
pub struct RuntimeClient {
    client: Docker,
}

impl RuntimeClient {
    /// Connect using the platform default local socket.
    pub fn connect_default() -> Result<Self> {
        let client = Docker::connect_with_local_defaults()?;
        Ok(Self { client })
    }

    /// Connect to a specific Unix socket path.
    pub fn connect_socket(path: &str) -> Result<Self> {
        let client = Docker::connect_with_socket(path, 120, bollard::API_DEFAULT_VERSION)?;
        Ok(Self { client })
    }

    /// One round-trip ping, used by the `diagnostics` subcommand.
    pub async fn ping(&self) -> Result<()> {
        self.client.ping().await?;
        Ok(())
    }

    /// Ids of currently running containers, used for the bootstrap pass.
    pub async fn list_running_ids(&self) -> Result<Vec<String>> {
        let mut filters = HashMap::new();
        filters.insert("status".to_string(), vec!["running".to_string()]);

        let options = ListContainersOptions::<String> {
            all: false,
            filters,
            ..Default::default()
        };

        let summaries = self.client.list_containers(Some(options)).await?;
        Ok(summaries.into_iter().filter_map(|c| c.id).collect())
    }

    /// Full inspect record for one container. A container that has already
    /// disappeared surfaces as `ContainerNotFound`, which callers treat as
    /// a record absent from this host.
    pub async fn inspect(&self, id: &str) -> Result<ContainerInspectResponse> {
        self.client
            .inspect_container(id, None)
            .await
            .map_err(|e| match &e {
                bollard::errors::Error::DockerResponseServerError { status_code, .. }
                    if *status_code == 404 =>
                {
                    RegistratorError::ContainerNotFound(id.to_string())
                }
                _ => RegistratorError::Docker(e),
            })
    }

    /// Normalized lifecycle event stream. Already-decoded and mapped into
    /// [`ContainerEvent`]; the event loop never touches raw JSON frames.
    pub fn events(&self) -> impl Stream<Item = Result<ContainerEvent>> + '_ {
        let options = EventsOptions::<String> {
            since: None,
            until: None,
            filters: HashMap::new(),
        };
        self.client
            .events(Some(options))
            .map(|res| res.map(ContainerEvent::from).map_err(RegistratorError::from))
    }
}
