use std::sync::Arc;

use slm_storage::repository::{MaterialRepository, WorkOrderFilter, WorkOrderRepository};

use crate::error::QuoteServiceError;

/// Order count for one material, lattice orders included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialOrderCount {
    pub material_name: String,
    pub orders: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverviewStats {
    pub total_orders: u32,
    /// Orders eligible for efficiency estimates (non-lattice).
    pub valid_orders: u32,
    pub lattice_orders: u32,
    pub per_material_counts: Vec<MaterialOrderCount>,
}

/// Record counts for dashboards.
#[derive(Clone)]
pub struct StatisticsService {
    materials: Arc<dyn MaterialRepository>,
    work_orders: Arc<dyn WorkOrderRepository>,
}

impl StatisticsService {
    #[must_use]
    pub fn new(
        materials: Arc<dyn MaterialRepository>,
        work_orders: Arc<dyn WorkOrderRepository>,
    ) -> Self {
        Self {
            materials,
            work_orders,
        }
    }

    /// # Errors
    ///
    /// Returns `QuoteServiceError::Storage` if repository access fails.
    pub async fn overview_stats(&self) -> Result<OverviewStats, QuoteServiceError> {
        let total = self.work_orders.aggregate(WorkOrderFilter::all()).await?;
        let valid = self
            .work_orders
            .aggregate(WorkOrderFilter::all().lattice(false))
            .await?;

        let mut per_material_counts = Vec::new();
        for material in self.materials.list_materials().await? {
            let agg = self
                .work_orders
                .aggregate(WorkOrderFilter::for_material(material.id()))
                .await?;
            per_material_counts.push(MaterialOrderCount {
                material_name: material.name().to_owned(),
                orders: agg.count,
            });
        }

        Ok(OverviewStats {
            total_orders: total.count,
            valid_orders: valid.count,
            lattice_orders: total.count.saturating_sub(valid.count),
            per_material_counts,
        })
    }
}
