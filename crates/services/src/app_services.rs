use std::sync::Arc;

use slm_core::{Clock, QuoteConfig};
use slm_storage::repository::Storage;

use crate::cost_calculator::CostCalculator;
use crate::efficiency_service::EfficiencyService;
use crate::error::AppServicesError;
use crate::machine_config_service::MachineConfigService;
use crate::quote_service::QuoteService;
use crate::seed::{SeedReport, ensure_cold_start_data};
use crate::statistics_service::StatisticsService;
use crate::work_order_service::WorkOrderService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    config: Arc<QuoteConfig>,
    seed_report: SeedReport,
    cost_calculator: Arc<CostCalculator>,
    efficiency: Arc<EfficiencyService>,
    quotes: Arc<QuoteService>,
    statistics: Arc<StatisticsService>,
    work_orders: Arc<WorkOrderService>,
    machines: Arc<MachineConfigService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage, migrated and seeded.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the configuration is invalid or storage
    /// initialization or seeding fails.
    pub async fn new_sqlite(
        db_url: &str,
        config: QuoteConfig,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(storage, config, clock).await
    }

    /// Build services over an existing storage backend, seeding it first.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the configuration is invalid or seeding
    /// fails.
    pub async fn from_storage(
        storage: Storage,
        config: QuoteConfig,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        config.validate()?;
        let seed_report = ensure_cold_start_data(&storage, &config, clock).await?;
        let config = Arc::new(config);

        let cost_calculator =
            CostCalculator::new(Arc::clone(&config), Arc::clone(&storage.machines));
        let efficiency = EfficiencyService::new(
            Arc::clone(&config),
            Arc::clone(&storage.materials),
            Arc::clone(&storage.work_orders),
        );
        let quotes = Arc::new(QuoteService::new(
            Arc::clone(&config),
            cost_calculator.clone(),
            efficiency.clone(),
        ));
        let statistics = Arc::new(StatisticsService::new(
            Arc::clone(&storage.materials),
            Arc::clone(&storage.work_orders),
        ));
        let work_orders = Arc::new(WorkOrderService::new(
            clock,
            Arc::clone(&storage.materials),
            Arc::clone(&storage.work_orders),
        ));
        let machines = Arc::new(MachineConfigService::new(
            clock,
            Arc::clone(&config),
            Arc::clone(&storage.machines),
        ));

        Ok(Self {
            config,
            seed_report,
            cost_calculator: Arc::new(cost_calculator),
            efficiency: Arc::new(efficiency),
            quotes,
            statistics,
            work_orders,
            machines,
        })
    }

    #[must_use]
    pub fn config(&self) -> Arc<QuoteConfig> {
        Arc::clone(&self.config)
    }

    /// What the startup seeding pass wrote.
    #[must_use]
    pub fn seed_report(&self) -> SeedReport {
        self.seed_report
    }

    #[must_use]
    pub fn cost_calculator(&self) -> Arc<CostCalculator> {
        Arc::clone(&self.cost_calculator)
    }

    #[must_use]
    pub fn efficiency(&self) -> Arc<EfficiencyService> {
        Arc::clone(&self.efficiency)
    }

    #[must_use]
    pub fn quotes(&self) -> Arc<QuoteService> {
        Arc::clone(&self.quotes)
    }

    #[must_use]
    pub fn statistics(&self) -> Arc<StatisticsService> {
        Arc::clone(&self.statistics)
    }

    #[must_use]
    pub fn work_orders(&self) -> Arc<WorkOrderService> {
        Arc::clone(&self.work_orders)
    }

    #[must_use]
    pub fn machines(&self) -> Arc<MachineConfigService> {
        Arc::clone(&self.machines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use slm_core::config::ConfigError;
    use slm_core::time::fixed_clock;

    #[tokio::test]
    async fn in_memory_services_start_seeded() {
        let services = AppServices::from_storage(
            Storage::in_memory(),
            QuoteConfig::default(),
            fixed_clock(),
        )
        .await
        .unwrap();
        assert_eq!(services.seed_report().work_orders, 10);
        let current = services.machines().current().await.unwrap().unwrap();
        assert_eq!(current.config.machine_name(), "DW-HP120");
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_before_seeding() {
        let config = QuoteConfig {
            machines: Vec::new(),
            ..QuoteConfig::default()
        };
        let err = AppServices::from_storage(Storage::in_memory(), config, fixed_clock())
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            AppServicesError::Config(ConfigError::EmptyMachineCatalog)
        ));
    }
}
