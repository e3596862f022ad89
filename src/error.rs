//! Error taxonomy for the registrator bridge.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistratorError {
    #[error("Docker error: {0}")]
    Docker(#[from] bollard::errors::Error),

    #[error("etcd error: {0}")]
    Etcd(#[from] etcd_client::Error),

    #[error("container not found: {0}")]
    ContainerNotFound(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, RegistratorError>;
