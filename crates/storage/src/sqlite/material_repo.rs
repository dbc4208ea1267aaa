use slm_core::model::Material;

use super::SqliteRepository;
use super::mapping::{db_err, map_material_row};
use crate::repository::{MaterialRepository, NewMaterialRecord, StorageError};

#[async_trait::async_trait]
impl MaterialRepository for SqliteRepository {
    async fn ensure_material(&self, material: NewMaterialRecord) -> Result<Material, StorageError> {
        sqlx::query(
            r"
            INSERT INTO materials (name, default_efficiency, description)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(name) DO NOTHING
            ",
        )
        .bind(&material.name)
        .bind(material.default_efficiency)
        .bind(&material.description)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        self.get_material_by_name(&material.name)
            .await?
            .ok_or(StorageError::NotFound)
    }

    async fn get_material_by_name(&self, name: &str) -> Result<Option<Material>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, name, default_efficiency, description
            FROM materials WHERE name = ?1
            ",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_material_row).transpose()
    }

    async fn list_materials(&self) -> Result<Vec<Material>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, default_efficiency, description
            FROM materials
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_material_row).collect()
    }
}
