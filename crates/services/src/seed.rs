//! Cold-start data for an empty store.

use chrono::Duration;
use slm_core::config::ConfigError;
use slm_core::{Clock, QuoteConfig};
use slm_storage::repository::{
    NewMachineConfigRecord, NewMaterialRecord, NewWorkOrderRecord, Storage, WorkOrderFilter,
};
use tracing::info;

use crate::error::AppServicesError;

/// What a seeding pass actually wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub materials: u32,
    pub work_orders: u32,
    pub machine_activated: bool,
}

impl SeedReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.materials == 0 && self.work_orders == 0 && !self.machine_activated
    }
}

/// Make sure the configured materials exist, give them sample history when
/// the store has no work orders yet, and activate the default machine when
/// nothing is active. Running it again changes nothing.
///
/// Sample orders are backdated one day apart so the newest sample is the
/// first one listed in the configuration.
///
/// # Errors
///
/// Returns `AppServicesError` if the configuration is inconsistent or a
/// write fails.
pub async fn ensure_cold_start_data(
    storage: &Storage,
    config: &QuoteConfig,
    clock: Clock,
) -> Result<SeedReport, AppServicesError> {
    let mut report = SeedReport::default();
    let now = clock.now();

    let seed_history = storage
        .work_orders
        .aggregate(WorkOrderFilter::all())
        .await?
        .count
        == 0;

    for spec in &config.materials {
        let existed = storage
            .materials
            .get_material_by_name(spec.name.trim())
            .await?
            .is_some();
        let material = storage
            .materials
            .ensure_material(NewMaterialRecord::from_spec(spec))
            .await?;
        if !existed {
            report.materials += 1;
        }

        if !seed_history {
            continue;
        }
        for (days_ago, sample) in (0_i64..).zip(&spec.samples) {
            storage
                .work_orders
                .insert_work_order(NewWorkOrderRecord {
                    material_id: material.id(),
                    weight_g: sample.weight_g,
                    time_min: sample.time_min,
                    is_lattice: sample.is_lattice,
                    note: sample.note.clone(),
                    created_at: now - Duration::days(days_ago),
                })
                .await?;
            report.work_orders += 1;
        }
    }

    if storage.machines.active_config().await?.is_none() {
        let machine = config
            .machine(&config.default_machine)
            .ok_or_else(|| ConfigError::UnknownDefaultMachine(config.default_machine.clone()))?;
        storage
            .machines
            .activate(NewMachineConfigRecord {
                machine_name: machine.name.clone(),
                total_price: machine.total_price,
                depreciation_years: config.default_depreciation_years,
                updated_at: now,
            })
            .await?;
        report.machine_activated = true;
    }

    if !report.is_empty() {
        info!(
            materials = report.materials,
            work_orders = report.work_orders,
            machine_activated = report.machine_activated,
            "seeded cold-start data"
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    use slm_core::time::fixed_clock;

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let storage = Storage::in_memory();
        let config = QuoteConfig::default();

        let first = ensure_cold_start_data(&storage, &config, fixed_clock())
            .await
            .unwrap();
        assert_eq!(
            first,
            SeedReport {
                materials: 2,
                work_orders: 10,
                machine_activated: true,
            }
        );

        let second = ensure_cold_start_data(&storage, &config, fixed_clock())
            .await
            .unwrap();
        assert!(second.is_empty());
        assert_eq!(
            storage
                .work_orders
                .aggregate(WorkOrderFilter::all())
                .await
                .unwrap()
                .count,
            10
        );
    }

    #[tokio::test]
    async fn default_machine_is_activated() {
        let storage = Storage::in_memory();
        ensure_cold_start_data(&storage, &QuoteConfig::default(), fixed_clock())
            .await
            .unwrap();
        let active = storage.machines.active_config().await.unwrap().unwrap();
        assert_eq!(active.machine_name(), "DW-HP120");
        assert_eq!(active.total_price(), 1_500_000);
        assert_eq!(active.depreciation_years(), 3);
    }

    #[tokio::test]
    async fn existing_history_is_not_padded() {
        let storage = Storage::in_memory();
        let mut config = QuoteConfig::default();
        config.materials.truncate(1);
        ensure_cold_start_data(&storage, &config, fixed_clock())
            .await
            .unwrap();

        // A material added later gets created but no sample history.
        let report = ensure_cold_start_data(&storage, &QuoteConfig::default(), fixed_clock())
            .await
            .unwrap();
        assert_eq!(report.materials, 1);
        assert_eq!(report.work_orders, 0);
        assert!(!report.machine_activated);
    }
}
