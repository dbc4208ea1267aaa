use std::sync::Arc;

use slm_core::model::{MachineConfig, MachineConfigError};
use slm_core::{Clock, QuoteConfig};
use slm_storage::repository::{MachineConfigRepository, NewMachineConfigRecord};
use tracing::info;

use crate::cost_calculator::CostCalculator;
use crate::error::MachineConfigServiceError;

/// The active configuration together with its operating rate.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveMachine {
    pub config: MachineConfig,
    pub cost_per_min: f64,
}

/// Selects which catalog machine and horizon drive machine cost.
#[derive(Clone)]
pub struct MachineConfigService {
    clock: Clock,
    config: Arc<QuoteConfig>,
    machines: Arc<dyn MachineConfigRepository>,
    costs: CostCalculator,
}

impl MachineConfigService {
    #[must_use]
    pub fn new(
        clock: Clock,
        config: Arc<QuoteConfig>,
        machines: Arc<dyn MachineConfigRepository>,
    ) -> Self {
        let costs = CostCalculator::new(Arc::clone(&config), Arc::clone(&machines));
        Self {
            clock,
            config,
            machines,
            costs,
        }
    }

    /// Make `machine_name` with `depreciation_years` the active configuration.
    ///
    /// The price comes from the catalog, not from the caller.
    ///
    /// # Errors
    ///
    /// Returns `MachineConfigServiceError::MachineConfig` for a machine not in
    /// the catalog or a horizon that is not offered, and
    /// `MachineConfigServiceError::Storage` if the swap fails.
    pub async fn select(
        &self,
        machine_name: &str,
        depreciation_years: u32,
    ) -> Result<MachineConfig, MachineConfigServiceError> {
        let machine_name = machine_name.trim();
        if machine_name.is_empty() {
            return Err(MachineConfigError::EmptyMachineName.into());
        }
        let spec = self
            .config
            .machine(machine_name)
            .ok_or_else(|| MachineConfigError::UnknownMachine(machine_name.to_owned()))?;
        if !self.config.allows_depreciation_years(depreciation_years) {
            return Err(MachineConfigError::UnsupportedDepreciationYears(depreciation_years).into());
        }

        let activated = self
            .machines
            .activate(NewMachineConfigRecord {
                machine_name: spec.name.clone(),
                total_price: spec.total_price,
                depreciation_years,
                updated_at: self.clock.now(),
            })
            .await?;
        info!(
            machine = activated.machine_name(),
            years = depreciation_years,
            "machine configuration selected"
        );
        Ok(activated)
    }

    /// The active configuration, if any, with its per-minute rate.
    ///
    /// # Errors
    ///
    /// Returns `MachineConfigServiceError::Storage` if repository access fails.
    pub async fn current(&self) -> Result<Option<ActiveMachine>, MachineConfigServiceError> {
        let active = self.machines.active_config().await?;
        Ok(active.map(|config| {
            let cost_per_min = self
                .costs
                .cost_per_minute(config.total_price(), config.depreciation_years());
            ActiveMachine {
                config,
                cost_per_min,
            }
        }))
    }
}
