//! Shared error types for the services crate.

use thiserror::Error;

use slm_core::config::ConfigError;
use slm_core::model::{MachineConfigError, WorkOrderError};
use slm_storage::repository::StorageError;
use slm_storage::sqlite::SqliteInitError;

/// Errors emitted by the read-only pricing services.
///
/// Business conditions never fail a quote; only storage can.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuoteServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `WorkOrderService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WorkOrderServiceError {
    #[error("unknown material: {0}")]
    UnknownMaterial(String),
    #[error(transparent)]
    WorkOrder(#[from] WorkOrderError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `MachineConfigService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MachineConfigServiceError {
    #[error(transparent)]
    MachineConfig(#[from] MachineConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    MachineConfig(#[from] MachineConfigError),
}
