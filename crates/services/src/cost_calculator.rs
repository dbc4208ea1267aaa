use std::collections::BTreeMap;
use std::sync::Arc;

use slm_core::QuoteConfig;
use slm_core::config::MachineSpec;
use slm_core::pricing;
use slm_storage::repository::MachineConfigRepository;
use tracing::debug;

use crate::error::QuoteServiceError;

/// Per-minute rates keyed by machine name, then by depreciation years.
pub type CostTable = BTreeMap<String, BTreeMap<u32, f64>>;

/// Turns machine capital cost into a per-minute operating rate.
#[derive(Clone)]
pub struct CostCalculator {
    config: Arc<QuoteConfig>,
    machines: Arc<dyn MachineConfigRepository>,
}

impl CostCalculator {
    #[must_use]
    pub fn new(config: Arc<QuoteConfig>, machines: Arc<dyn MachineConfigRepository>) -> Self {
        Self { config, machines }
    }

    /// Rate for one machine price spread over `depreciation_years` of the
    /// configured working calendar. Zero years yields `0.0`.
    #[must_use]
    pub fn cost_per_minute(&self, total_price: u64, depreciation_years: u32) -> f64 {
        pricing::cost_per_minute(total_price, depreciation_years, &self.config.schedule)
    }

    /// Rates for every machine in `catalog` under every configured
    /// depreciation option.
    #[must_use]
    pub fn cost_table(&self, catalog: &[MachineSpec]) -> CostTable {
        catalog
            .iter()
            .map(|machine| {
                let by_years = self
                    .config
                    .depreciation_years_options
                    .iter()
                    .map(|&years| (years, self.cost_per_minute(machine.total_price, years)))
                    .collect();
                (machine.name.clone(), by_years)
            })
            .collect()
    }

    /// Same as [`CostCalculator::cost_table`] over the configured catalog.
    #[must_use]
    pub fn catalog_cost_table(&self) -> CostTable {
        self.cost_table(&self.config.machines)
    }

    /// Rate of the active machine configuration, or `0.0` when none is active.
    ///
    /// # Errors
    ///
    /// Returns `QuoteServiceError::Storage` if the active configuration
    /// cannot be read.
    pub async fn current_cost_per_minute(&self) -> Result<f64, QuoteServiceError> {
        match self.machines.active_config().await? {
            Some(active) => {
                Ok(self.cost_per_minute(active.total_price(), active.depreciation_years()))
            }
            None => {
                debug!("no active machine configuration, machine cost is zero");
                Ok(0.0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use slm_core::time::fixed_now;
    use slm_storage::repository::{InMemoryRepository, NewMachineConfigRecord};

    fn calculator(repo: InMemoryRepository) -> CostCalculator {
        CostCalculator::new(Arc::new(QuoteConfig::default()), Arc::new(repo))
    }

    #[test]
    fn cost_table_matches_single_rates() {
        let calc = calculator(InMemoryRepository::new());
        let table = calc.catalog_cost_table();

        assert_eq!(table.len(), 2);
        for machine in &QuoteConfig::default().machines {
            let row = &table[&machine.name];
            assert_eq!(row.keys().copied().collect::<Vec<_>>(), [1, 2, 3]);
            for (&years, &rate) in row {
                let expected = calc.cost_per_minute(machine.total_price, years);
                assert!((rate - expected).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn cost_table_accepts_an_ad_hoc_catalog() {
        let calc = calculator(InMemoryRepository::new());
        let table = calc.cost_table(&[MachineSpec {
            name: "Bench".into(),
            total_price: 475_200,
        }]);
        assert!((table["Bench"][&1] - 1.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn no_active_machine_costs_nothing() {
        let calc = calculator(InMemoryRepository::new());
        let rate = calc.current_cost_per_minute().await.unwrap();
        assert!(rate.abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn active_machine_sets_current_rate() {
        let repo = InMemoryRepository::new();
        repo.activate(NewMachineConfigRecord {
            machine_name: "DW-HP120".into(),
            total_price: 1_500_000,
            depreciation_years: 3,
            updated_at: fixed_now(),
        })
        .await
        .unwrap();

        let rate = calculator(repo).current_cost_per_minute().await.unwrap();
        assert!((rate - 3.156).abs() < 1e-3);
    }
}
