use std::sync::Arc;

use slm_core::QuoteConfig;
use slm_core::model::EfficiencyEstimate;
use slm_core::pricing;
use slm_storage::repository::{MaterialRepository, WorkOrderFilter, WorkOrderRepository};
use tracing::debug;

use crate::error::QuoteServiceError;

/// Efficiency estimate for a named material.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialEfficiency {
    pub material_name: String,
    pub estimate: EfficiencyEstimate,
}

/// Derives current print rates from work-order history.
#[derive(Clone)]
pub struct EfficiencyService {
    config: Arc<QuoteConfig>,
    materials: Arc<dyn MaterialRepository>,
    work_orders: Arc<dyn WorkOrderRepository>,
}

impl EfficiencyService {
    #[must_use]
    pub fn new(
        config: Arc<QuoteConfig>,
        materials: Arc<dyn MaterialRepository>,
        work_orders: Arc<dyn WorkOrderRepository>,
    ) -> Self {
        Self {
            config,
            materials,
            work_orders,
        }
    }

    /// Best-estimate rate for `material_name`.
    ///
    /// Unknown materials fall back to the configured rate. Known materials
    /// use `sum(weight) / sum(time)` over their non-lattice orders, or their
    /// factory rate when there is no usable history.
    ///
    /// # Errors
    ///
    /// Returns `QuoteServiceError::Storage` if repository access fails.
    pub async fn material_efficiency(
        &self,
        material_name: &str,
    ) -> Result<EfficiencyEstimate, QuoteServiceError> {
        let Some(material) = self.materials.get_material_by_name(material_name).await? else {
            debug!(material_name, "unknown material, using fallback efficiency");
            return Ok(EfficiencyEstimate::fallback(self.config.fallback_efficiency));
        };

        let history = self
            .work_orders
            .aggregate(WorkOrderFilter::efficiency_samples(material.id()))
            .await?;
        if history.count == 0 {
            return Ok(EfficiencyEstimate::preset(material.default_efficiency()));
        }

        match pricing::weighted_efficiency(history.total_weight_g, history.total_time_min) {
            Some(efficiency) => Ok(EfficiencyEstimate::from_history(efficiency, history.count)),
            None => {
                debug!(
                    material_name,
                    records = history.count,
                    "history has no usable print time, using preset efficiency"
                );
                Ok(EfficiencyEstimate::preset(material.default_efficiency()))
            }
        }
    }

    /// Estimates for every stored material, in storage order.
    ///
    /// # Errors
    ///
    /// Returns `QuoteServiceError::Storage` if repository access fails.
    pub async fn all_materials_efficiency(
        &self,
    ) -> Result<Vec<MaterialEfficiency>, QuoteServiceError> {
        let materials = self.materials.list_materials().await?;
        let mut out = Vec::with_capacity(materials.len());
        for material in materials {
            let estimate = self.material_efficiency(material.name()).await?;
            out.push(MaterialEfficiency {
                material_name: material.name().to_owned(),
                estimate,
            });
        }
        Ok(out)
    }
}
