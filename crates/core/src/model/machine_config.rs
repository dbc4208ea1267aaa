use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::MachineConfigId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MachineConfigError {
    #[error("machine name cannot be empty")]
    EmptyMachineName,

    #[error("unknown machine: {0}")]
    UnknownMachine(String),

    #[error("machine price must be > 0")]
    ZeroPrice,

    #[error("depreciation years {0} is not one of the allowed options")]
    UnsupportedDepreciationYears(u32),
}

/// A machine selection with its depreciation horizon.
///
/// Only one configuration is active at a time; storage enforces that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineConfig {
    id: MachineConfigId,
    machine_name: String,
    total_price: u64,
    depreciation_years: u32,
    is_active: bool,
    updated_at: DateTime<Utc>,
}

impl MachineConfig {
    /// Creates a configuration snapshot.
    ///
    /// # Errors
    ///
    /// Returns `MachineConfigError` for a blank machine name, a zero price,
    /// or a zero depreciation horizon.
    pub fn new(
        id: MachineConfigId,
        machine_name: impl Into<String>,
        total_price: u64,
        depreciation_years: u32,
        is_active: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, MachineConfigError> {
        let machine_name = machine_name.into().trim().to_owned();
        if machine_name.is_empty() {
            return Err(MachineConfigError::EmptyMachineName);
        }
        if total_price == 0 {
            return Err(MachineConfigError::ZeroPrice);
        }
        if depreciation_years == 0 {
            return Err(MachineConfigError::UnsupportedDepreciationYears(0));
        }

        Ok(Self {
            id,
            machine_name,
            total_price,
            depreciation_years,
            is_active,
            updated_at,
        })
    }

    /// Same configuration with the active flag replaced.
    #[must_use]
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    #[must_use]
    pub fn id(&self) -> MachineConfigId {
        self.id
    }

    #[must_use]
    pub fn machine_name(&self) -> &str {
        &self.machine_name
    }

    /// Acquisition price in whole currency units.
    #[must_use]
    pub fn total_price(&self) -> u64 {
        self.total_price
    }

    #[must_use]
    pub fn depreciation_years(&self) -> u32 {
        self.depreciation_years
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
