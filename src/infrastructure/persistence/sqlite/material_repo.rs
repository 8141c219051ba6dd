//! SQLite Material Repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::DbPool;
use crate::application::ports::{MaterialRecord, MaterialRepositoryPort, RepositoryError};
use crate::domain::reading::MaterialId;

/// SQLite Material Repository
pub struct SqliteMaterialRepository {
    pool: DbPool,
}

impl SqliteMaterialRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct MaterialRow {
    id: String,
    file_type: String,
    file_size: i64,
    page_count: Option<i64>,
    created_at: String,
}

impl TryFrom<MaterialRow> for MaterialRecord {
    type Error = RepositoryError;

    fn try_from(row: MaterialRow) -> Result<Self, Self::Error> {
        Ok(MaterialRecord {
            id: MaterialId::new(row.id)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            file_type: row.file_type,
            file_size: row.file_size.max(0) as u64,
            page_count: row.page_count.map(|n| n as u32),
            created_at: DateTime::parse_from_rfc3339(&row.created_at)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?
                .with_timezone(&Utc),
        })
    }
}

#[async_trait]
impl MaterialRepositoryPort for SqliteMaterialRepository {
    async fn upsert(&self, material: &MaterialRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO materials (id, file_type, file_size, page_count, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                file_type = excluded.file_type,
                file_size = excluded.file_size,
                page_count = excluded.page_count
            "#,
        )
        .bind(material.id.as_str())
        .bind(&material.file_type)
        .bind(material.file_size as i64)
        .bind(material.page_count.map(i64::from))
        .bind(material.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &MaterialId) -> Result<Option<MaterialRecord>, RepositoryError> {
        let row: Option<MaterialRow> = sqlx::query_as(
            "SELECT id, file_type, file_size, page_count, created_at FROM materials WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        row.map(MaterialRecord::try_from).transpose()
    }
}
