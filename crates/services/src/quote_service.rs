use std::sync::Arc;

use slm_core::QuoteConfig;
use slm_core::model::{QuoteBreakdown, QuoteRequest};
use slm_core::pricing;
use tracing::debug;

use crate::cost_calculator::CostCalculator;
use crate::efficiency_service::EfficiencyService;
use crate::error::QuoteServiceError;

/// Combines machine cost and material efficiency into a priced quote.
#[derive(Clone)]
pub struct QuoteService {
    config: Arc<QuoteConfig>,
    costs: CostCalculator,
    efficiency: EfficiencyService,
}

impl QuoteService {
    #[must_use]
    pub fn new(
        config: Arc<QuoteConfig>,
        costs: CostCalculator,
        efficiency: EfficiencyService,
    ) -> Self {
        Self {
            config,
            costs,
            efficiency,
        }
    }

    /// Price a job from current stored data.
    ///
    /// Expects a request that passed [`QuoteRequest::validate`]. A difficulty
    /// level missing from the tier table counts as factor 1.0.
    ///
    /// # Errors
    ///
    /// Returns `QuoteServiceError::Storage` if repository access fails.
    pub async fn calculate_quote(
        &self,
        request: &QuoteRequest,
    ) -> Result<QuoteBreakdown, QuoteServiceError> {
        let cost_per_min = self.costs.current_cost_per_minute().await?;
        let efficiency = self
            .efficiency
            .material_efficiency(&request.material_name)
            .await?;

        let time_min = pricing::predicted_minutes(request.weight_g, efficiency.efficiency);
        let base_print_price = time_min * cost_per_min;

        let (difficulty_label, difficulty_factor) =
            match self.config.difficulty_tier(request.difficulty) {
                Some(tier) => (tier.label.clone(), tier.factor),
                None => {
                    debug!(level = request.difficulty, "difficulty tier not configured");
                    (request.difficulty.to_string(), 1.0)
                }
            };
        let coefficient = pricing::coefficient(difficulty_factor, request.risk);
        let print_price = base_print_price * coefficient;

        let post_process_price = request.post_process_hours * request.post_process_rate;
        let total_quote = print_price + post_process_price;

        Ok(QuoteBreakdown {
            material_name: request.material_name.clone(),
            weight_g: request.weight_g,
            efficiency,
            cost_per_min,
            time_min,
            time_formatted: pricing::format_duration(time_min),
            base_print_price,
            difficulty: request.difficulty,
            difficulty_label,
            difficulty_factor,
            risk: request.risk,
            coefficient,
            print_price,
            post_process_hours: request.post_process_hours,
            post_process_rate: request.post_process_rate,
            post_process_price,
            total_quote,
            total_formatted: self.format_quote(total_quote),
        })
    }

    /// Amount in the configured currency, e.g. `¥12,345.00`.
    #[must_use]
    pub fn format_quote(&self, amount: f64) -> String {
        pricing::format_money(amount, &self.config.currency_symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use slm_core::time::fixed_now;
    use slm_storage::repository::{
        MachineConfigRepository, MaterialRepository, NewMachineConfigRecord, NewMaterialRecord,
        Storage,
    };

    fn build(storage: &Storage) -> QuoteService {
        let config = Arc::new(QuoteConfig::default());
        QuoteService::new(
            Arc::clone(&config),
            CostCalculator::new(Arc::clone(&config), Arc::clone(&storage.machines)),
            EfficiencyService::new(
                config,
                Arc::clone(&storage.materials),
                Arc::clone(&storage.work_orders),
            ),
        )
    }

    async fn activate_reference_machine(storage: &Storage) {
        storage
            .machines
            .activate(NewMachineConfigRecord {
                machine_name: "DW-HP120".into(),
                total_price: 1_500_000,
                depreciation_years: 3,
                updated_at: fixed_now(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn no_machine_means_post_processing_only() {
        let storage = Storage::in_memory();
        let request = QuoteRequest::new("316L", 100.0)
            .with_difficulty(3)
            .with_risk(1.0)
            .with_post_process(2.0, 150.0);

        let quote = build(&storage).calculate_quote(&request).await.unwrap();
        assert!(quote.cost_per_min.abs() < f64::EPSILON);
        assert!(quote.print_price.abs() < f64::EPSILON);
        assert!((quote.total_quote - 300.0).abs() < 1e-9);
        assert_eq!(quote.total_formatted, "¥300.00");
        // Unknown material still yields a time estimate from the fallback rate.
        assert_eq!(quote.efficiency.source_label(), "default");
        assert!((quote.time_min - 2000.0).abs() < 1e-9);
        assert!(quote.time_formatted.starts_with("33h "));
    }

    #[tokio::test]
    async fn coefficient_applies_to_machine_time_only() {
        let storage = Storage::in_memory();
        activate_reference_machine(&storage).await;
        storage
            .materials
            .ensure_material(NewMaterialRecord {
                name: "316L".into(),
                default_efficiency: 0.05,
                description: String::new(),
            })
            .await
            .unwrap();
        let service = build(&storage);

        let plain = service
            .calculate_quote(&QuoteRequest::new("316L", 100.0))
            .await
            .unwrap();
        let rate = 1_500_000.0 / 475_200.0;
        assert!((plain.base_print_price - 2000.0 * rate).abs() < 1e-6);
        assert!((plain.coefficient - 1.0).abs() < f64::EPSILON);
        assert_eq!(plain.difficulty_label, "normal");

        let hard = service
            .calculate_quote(
                &QuoteRequest::new("316L", 100.0)
                    .with_difficulty(2)
                    .with_risk(0.5)
                    .with_post_process(1.0, 80.0),
            )
            .await
            .unwrap();
        assert!((hard.coefficient - 2.25).abs() < 1e-12);
        assert!((hard.print_price - plain.base_print_price * 2.25).abs() < 1e-6);
        assert!((hard.post_process_price - 80.0).abs() < f64::EPSILON);
        assert!((hard.total_quote - (hard.print_price + 80.0)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn unconfigured_difficulty_counts_as_neutral() {
        let storage = Storage::in_memory();
        activate_reference_machine(&storage).await;
        let service = build(&storage);

        let quote = service
            .calculate_quote(&QuoteRequest::new("316L", 10.0).with_difficulty(7))
            .await
            .unwrap();
        assert!((quote.difficulty_factor - 1.0).abs() < f64::EPSILON);
        assert!((quote.print_price - quote.base_print_price).abs() < 1e-12);
    }

    #[tokio::test]
    async fn repeated_calls_are_identical() {
        let storage = Storage::in_memory();
        activate_reference_machine(&storage).await;
        let service = build(&storage);
        let request = QuoteRequest::new("TC4", 42.0).with_risk(2.0);

        let first = service.calculate_quote(&request).await.unwrap();
        let second = service.calculate_quote(&request).await.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn format_quote_uses_configured_currency() {
        let service = build(&Storage::in_memory());
        assert_eq!(service.format_quote(12_345.0), "¥12,345.00");
    }
}
