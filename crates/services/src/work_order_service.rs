use std::sync::Arc;

use slm_core::Clock;
use slm_core::model::{WorkOrder, WorkOrderDraft, WorkOrderId};
use slm_storage::repository::{MaterialRepository, NewWorkOrderRecord, WorkOrderRepository};
use tracing::info;

use crate::error::WorkOrderServiceError;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_RECENT_LIMIT: u32 = 20;

/// Result of recording a print: the new id and the record's own rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedWorkOrder {
    pub id: WorkOrderId,
    pub efficiency: f64,
}

/// Records and removes historical prints.
#[derive(Clone)]
pub struct WorkOrderService {
    clock: Clock,
    materials: Arc<dyn MaterialRepository>,
    work_orders: Arc<dyn WorkOrderRepository>,
}

impl WorkOrderService {
    #[must_use]
    pub fn new(
        clock: Clock,
        materials: Arc<dyn MaterialRepository>,
        work_orders: Arc<dyn WorkOrderRepository>,
    ) -> Self {
        Self {
            clock,
            materials,
            work_orders,
        }
    }

    /// Validate and store a completed print.
    ///
    /// # Errors
    ///
    /// Returns `WorkOrderServiceError::WorkOrder` for invalid measurements,
    /// `WorkOrderServiceError::UnknownMaterial` if the material is not stored,
    /// or `WorkOrderServiceError::Storage` if persistence fails.
    pub async fn record(
        &self,
        draft: WorkOrderDraft,
    ) -> Result<RecordedWorkOrder, WorkOrderServiceError> {
        let draft = draft.validate()?;
        let material = self
            .materials
            .get_material_by_name(&draft.material_name)
            .await?
            .ok_or_else(|| WorkOrderServiceError::UnknownMaterial(draft.material_name.clone()))?;

        let efficiency = draft.efficiency();
        let id = self
            .work_orders
            .insert_work_order(NewWorkOrderRecord {
                material_id: material.id(),
                weight_g: draft.weight_g,
                time_min: draft.time_min,
                is_lattice: draft.is_lattice,
                note: draft.note,
                created_at: self.clock.now(),
            })
            .await?;

        info!(
            %id,
            material = material.name(),
            weight_g = draft.weight_g,
            time_min = draft.time_min,
            lattice = draft.is_lattice,
            "recorded work order"
        );
        Ok(RecordedWorkOrder { id, efficiency })
    }

    /// Remove a work order. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns `WorkOrderServiceError::Storage` if persistence fails.
    pub async fn delete(&self, id: WorkOrderId) -> Result<bool, WorkOrderServiceError> {
        let deleted = self.work_orders.delete_work_order(id).await?;
        if deleted {
            info!(%id, "deleted work order");
        }
        Ok(deleted)
    }

    /// Newest orders first; `None` uses [`DEFAULT_RECENT_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns `WorkOrderServiceError::Storage` if repository access fails.
    pub async fn recent(
        &self,
        limit: Option<u32>,
    ) -> Result<Vec<WorkOrder>, WorkOrderServiceError> {
        let orders = self
            .work_orders
            .recent_work_orders(limit.unwrap_or(DEFAULT_RECENT_LIMIT))
            .await?;
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use slm_core::model::WorkOrderError;
    use slm_core::time::{fixed_clock, fixed_now};
    use slm_storage::repository::{NewMaterialRecord, Storage};

    async fn service() -> WorkOrderService {
        let storage = Storage::in_memory();
        storage
            .materials
            .ensure_material(NewMaterialRecord {
                name: "316L Stainless Steel".into(),
                default_efficiency: 0.053,
                description: String::new(),
            })
            .await
            .unwrap();
        WorkOrderService::new(fixed_clock(), storage.materials, storage.work_orders)
    }

    #[tokio::test]
    async fn record_converts_hours_and_minutes() {
        let service = service().await;
        let recorded = service
            .record(WorkOrderDraft::from_hours_minutes(
                " 316L Stainless Steel ",
                150.0,
                47.0,
                10.0,
                false,
                "structural part",
            ))
            .await
            .unwrap();
        assert!((recorded.efficiency - 150.0 / 2830.0).abs() < 1e-12);
        let recent = service.recent(None).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id(), recorded.id);
        assert!((recent[0].time_min() - 2830.0).abs() < f64::EPSILON);
        assert_eq!(recent[0].created_at(), fixed_now());
    }

    #[tokio::test]
    async fn record_rejects_bad_input() {
        let service = service().await;

        let err = service
            .record(WorkOrderDraft::from_hours_minutes(
                "316L Stainless Steel",
                0.0,
                1.0,
                0.0,
                false,
                "",
            ))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkOrderServiceError::WorkOrder(WorkOrderError::NonPositiveWeight(_))
        ));

        let err = service
            .record(WorkOrderDraft::from_hours_minutes(
                "316L Stainless Steel",
                5.0,
                0.0,
                0.0,
                false,
                "",
            ))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkOrderServiceError::WorkOrder(WorkOrderError::NonPositiveTime(_))
        ));

        let err = service
            .record(WorkOrderDraft::from_hours_minutes("Inconel", 5.0, 1.0, 0.0, false, ""))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkOrderServiceError::UnknownMaterial(name) if name == "Inconel"));
        assert!(service.recent(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_reports_missing_rows() {
        let service = service().await;
        let recorded = service
            .record(WorkOrderDraft::from_hours_minutes(
                "316L Stainless Steel",
                5.0,
                0.0,
                90.0,
                true,
                "",
            ))
            .await
            .unwrap();
        assert!(service.delete(recorded.id).await.unwrap());
        assert!(!service.delete(recorded.id).await.unwrap());
    }

    #[tokio::test]
    async fn recent_honours_limit() {
        let service = service().await;
        for _ in 0..3 {
            service
                .record(WorkOrderDraft::from_hours_minutes(
                    "316L Stainless Steel",
                    5.0,
                    0.0,
                    90.0,
                    false,
                    "",
                ))
                .await
                .unwrap();
        }
        assert_eq!(service.recent(Some(2)).await.unwrap().len(), 2);
        assert_eq!(service.recent(None).await.unwrap().len(), 3);
    }
}
