//! In-Memory Material Repository

use async_trait::async_trait;
use dashmap::DashMap;

use crate::application::ports::{MaterialRecord, MaterialRepositoryPort, RepositoryError};
use crate::domain::reading::MaterialId;

/// 内存资料元数据仓储
pub struct InMemoryMaterialRepository {
    materials: DashMap<MaterialId, MaterialRecord>,
}

impl InMemoryMaterialRepository {
    pub fn new() -> Self {
        Self {
            materials: DashMap::new(),
        }
    }
}

impl Default for InMemoryMaterialRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MaterialRepositoryPort for InMemoryMaterialRepository {
    async fn upsert(&self, material: &MaterialRecord) -> Result<(), RepositoryError> {
        self.materials.insert(material.id.clone(), material.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &MaterialId) -> Result<Option<MaterialRecord>, RepositoryError> {
        Ok(self.materials.get(id).map(|m| m.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let repo = InMemoryMaterialRepository::new();
        let id = MaterialId::new("doc").unwrap();
        let mut record = MaterialRecord {
            id: id.clone(),
            file_type: "pdf".to_string(),
            file_size: 1024,
            page_count: None,
            created_at: Utc::now(),
        };
        repo.upsert(&record).await.unwrap();

        record.page_count = Some(12);
        repo.upsert(&record).await.unwrap();

        let stored = repo.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.page_count, Some(12));
        assert!(repo
            .find_by_id(&MaterialId::new("other").unwrap())
            .await
            .unwrap()
            .is_none());
    }
}
