use chrono::{DateTime, Utc};
use slm_core::model::{
    MachineConfig, MachineConfigId, Material, MaterialId, WorkOrder, WorkOrderId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Maps a sqlx error, turning constraint violations into domain-level variants.
pub(crate) fn db_err(e: sqlx::Error) -> StorageError {
    match e.as_database_error() {
        Some(db) if db.is_foreign_key_violation() => StorageError::NotFound,
        Some(db) if db.is_unique_violation() || db.is_check_violation() => StorageError::Conflict,
        _ => StorageError::Connection(e.to_string()),
    }
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn material_id_from_i64(v: i64) -> Result<MaterialId, StorageError> {
    Ok(MaterialId::new(i64_to_u64("material_id", v)?))
}

pub(crate) fn work_order_id_from_i64(v: i64) -> Result<WorkOrderId, StorageError> {
    Ok(WorkOrderId::new(i64_to_u64("work_order_id", v)?))
}

pub(crate) fn machine_config_id_from_i64(v: i64) -> Result<MachineConfigId, StorageError> {
    Ok(MachineConfigId::new(i64_to_u64("machine_config_id", v)?))
}

pub(crate) fn map_material_row(row: &SqliteRow) -> Result<Material, StorageError> {
    Material::new(
        material_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get::<f64, _>("default_efficiency").map_err(ser)?,
        row.try_get::<String, _>("description").map_err(ser)?,
    )
    .map_err(ser)
}

/// Expects the work order columns plus `material_name` from a join.
pub(crate) fn map_work_order_row(row: &SqliteRow) -> Result<WorkOrder, StorageError> {
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(ser)?;
    Ok(WorkOrder::from_persisted(
        work_order_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        material_id_from_i64(row.try_get::<i64, _>("material_id").map_err(ser)?)?,
        row.try_get::<String, _>("material_name").map_err(ser)?,
        row.try_get::<f64, _>("weight_g").map_err(ser)?,
        row.try_get::<f64, _>("time_min").map_err(ser)?,
        row.try_get::<i64, _>("is_lattice").map_err(ser)? != 0,
        row.try_get::<String, _>("note").map_err(ser)?,
        created_at,
    ))
}

/// Expects the machine config columns plus an integer `is_active`.
pub(crate) fn map_machine_config_row(row: &SqliteRow) -> Result<MachineConfig, StorageError> {
    let total_price = row.try_get::<i64, _>("total_price").map_err(ser)?;
    let years = row.try_get::<i64, _>("depreciation_years").map_err(ser)?;

    MachineConfig::new(
        machine_config_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("machine_name").map_err(ser)?,
        i64_to_u64("total_price", total_price)?,
        u32::try_from(years).map_err(|_| {
            StorageError::Serialization(format!("invalid depreciation_years: {years}"))
        })?,
        row.try_get::<i64, _>("is_active").map_err(ser)? != 0,
        row.try_get("updated_at").map_err(ser)?,
    )
    .map_err(ser)
}
