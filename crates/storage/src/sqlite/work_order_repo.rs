use slm_core::model::{WorkOrder, WorkOrderId};
use sqlx::Row;
use tracing::debug;

use super::SqliteRepository;
use super::mapping::{db_err, id_to_i64, map_work_order_row, ser, work_order_id_from_i64};
use crate::repository::{
    NewWorkOrderRecord, StorageError, WorkOrderAggregate, WorkOrderFilter, WorkOrderRepository,
};

#[async_trait::async_trait]
impl WorkOrderRepository for SqliteRepository {
    async fn insert_work_order(
        &self,
        order: NewWorkOrderRecord,
    ) -> Result<WorkOrderId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO work_orders (material_id, weight_g, time_min, is_lattice, note, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(id_to_i64("material_id", order.material_id.value())?)
        .bind(order.weight_g)
        .bind(order.time_min)
        .bind(i64::from(order.is_lattice))
        .bind(order.note)
        .bind(order.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        work_order_id_from_i64(res.last_insert_rowid())
    }

    async fn delete_work_order(&self, id: WorkOrderId) -> Result<bool, StorageError> {
        let res = sqlx::query("DELETE FROM work_orders WHERE id = ?1")
            .bind(id_to_i64("work_order_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }

    async fn recent_work_orders(&self, limit: u32) -> Result<Vec<WorkOrder>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT w.id, w.material_id, m.name AS material_name, w.weight_g, w.time_min,
                   w.is_lattice, w.note, w.created_at
            FROM work_orders w
            JOIN materials m ON m.id = w.material_id
            ORDER BY w.created_at DESC, w.id DESC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_work_order_row).collect()
    }

    async fn aggregate(&self, filter: WorkOrderFilter) -> Result<WorkOrderAggregate, StorageError> {
        let material_id = filter
            .material_id
            .map(|id| id_to_i64("material_id", id.value()))
            .transpose()?;
        let is_lattice = filter.is_lattice.map(i64::from);

        let row = sqlx::query(
            r"
            SELECT
                COUNT(*) AS order_count,
                CAST(COALESCE(SUM(weight_g), 0) AS REAL) AS total_weight,
                CAST(COALESCE(SUM(time_min), 0) AS REAL) AS total_time
            FROM work_orders
            WHERE (?1 IS NULL OR material_id = ?1)
              AND (?2 IS NULL OR is_lattice = ?2)
            ",
        )
        .bind(material_id)
        .bind(is_lattice)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        let count: i64 = row.try_get("order_count").map_err(ser)?;
        let aggregate = WorkOrderAggregate {
            count: u32::try_from(count)
                .map_err(|_| StorageError::Serialization(format!("invalid count: {count}")))?,
            total_weight_g: row.try_get("total_weight").map_err(ser)?,
            total_time_min: row.try_get("total_time").map_err(ser)?,
        };
        debug!(?filter, count = aggregate.count, "aggregated work orders");
        Ok(aggregate)
    }
}
