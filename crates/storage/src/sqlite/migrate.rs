use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use super::SqliteInitError;

/// Runs the schema migrations that have not been applied yet.
///
/// Version 1 creates materials, work orders, machine configurations and the
/// single-row pointer to the active configuration.
#[allow(clippy::too_many_lines)]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS materials (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL UNIQUE,
                    default_efficiency REAL NOT NULL CHECK (default_efficiency > 0),
                    description TEXT NOT NULL DEFAULT ''
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS work_orders (
                    id INTEGER PRIMARY KEY,
                    material_id INTEGER NOT NULL,
                    weight_g REAL NOT NULL CHECK (weight_g > 0),
                    time_min REAL NOT NULL CHECK (time_min > 0),
                    is_lattice INTEGER NOT NULL DEFAULT 0 CHECK (is_lattice IN (0, 1)),
                    note TEXT NOT NULL DEFAULT '',
                    created_at TEXT NOT NULL,
                    FOREIGN KEY (material_id) REFERENCES materials(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS machine_configs (
                    id INTEGER PRIMARY KEY,
                    machine_name TEXT NOT NULL,
                    total_price INTEGER NOT NULL CHECK (total_price > 0),
                    depreciation_years INTEGER NOT NULL CHECK (depreciation_years > 0),
                    updated_at TEXT NOT NULL,
                    UNIQUE (machine_name, depreciation_years)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        // At most one row, so at most one active configuration.
        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS active_machine_config (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    config_id INTEGER NOT NULL,
                    FOREIGN KEY (config_id) REFERENCES machine_configs(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_work_orders_material_lattice
                    ON work_orders (material_id, is_lattice);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_work_orders_created
                    ON work_orders (created_at, id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(version = 1, "applied schema migration");
    }

    Ok(())
}
