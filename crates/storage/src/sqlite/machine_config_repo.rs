use slm_core::model::MachineConfig;
use tracing::info;

use super::SqliteRepository;
use super::mapping::{db_err, id_to_i64, map_machine_config_row};
use crate::repository::{MachineConfigRepository, NewMachineConfigRecord, StorageError};

#[async_trait::async_trait]
impl MachineConfigRepository for SqliteRepository {
    async fn activate(
        &self,
        config: NewMachineConfigRecord,
    ) -> Result<MachineConfig, StorageError> {
        let total_price = id_to_i64("total_price", config.total_price)?;

        // Write first so the transaction holds the write lock from the start.
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let row = sqlx::query(
            r"
            INSERT INTO machine_configs (machine_name, total_price, depreciation_years, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(machine_name, depreciation_years) DO UPDATE SET
                total_price = excluded.total_price,
                updated_at = excluded.updated_at
            RETURNING id, machine_name, total_price, depreciation_years, updated_at, 1 AS is_active
            ",
        )
        .bind(&config.machine_name)
        .bind(total_price)
        .bind(i64::from(config.depreciation_years))
        .bind(config.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;
        let activated = map_machine_config_row(&row)?;

        sqlx::query(
            r"
            INSERT INTO active_machine_config (id, config_id)
            VALUES (1, ?1)
            ON CONFLICT(id) DO UPDATE SET config_id = excluded.config_id
            ",
        )
        .bind(id_to_i64("machine_config_id", activated.id().value())?)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        info!(
            machine = activated.machine_name(),
            years = activated.depreciation_years(),
            "activated machine configuration"
        );
        Ok(activated)
    }

    async fn active_config(&self) -> Result<Option<MachineConfig>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT c.id, c.machine_name, c.total_price, c.depreciation_years, c.updated_at,
                   1 AS is_active
            FROM active_machine_config a
            JOIN machine_configs c ON c.id = a.config_id
            WHERE a.id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_machine_config_row).transpose()
    }

    async fn list_configs(&self) -> Result<Vec<MachineConfig>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT c.id, c.machine_name, c.total_price, c.depreciation_years, c.updated_at,
                   CASE WHEN a.config_id IS NULL THEN 0 ELSE 1 END AS is_active
            FROM machine_configs c
            LEFT JOIN active_machine_config a ON a.config_id = c.id
            ORDER BY c.id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_machine_config_row).collect()
    }
}
