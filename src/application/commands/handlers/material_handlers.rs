//! Material Command Handlers

use std::sync::Arc;

use chrono::Utc;

use crate::application::commands::RegisterMaterial;
use crate::application::error::ApplicationError;
use crate::application::ports::{MaterialRecord, MaterialRepositoryPort};
use crate::domain::reading::MAX_TOTAL_PAGES;

/// RegisterMaterial Handler
pub struct RegisterMaterialHandler {
    material_repo: Arc<dyn MaterialRepositoryPort>,
}

impl RegisterMaterialHandler {
    pub fn new(material_repo: Arc<dyn MaterialRepositoryPort>) -> Self {
        Self { material_repo }
    }

    pub async fn handle(&self, cmd: RegisterMaterial) -> Result<MaterialRecord, ApplicationError> {
        let file_type = cmd.file_type.trim().to_string();
        if file_type.is_empty() {
            return Err(ApplicationError::validation("fileType cannot be empty"));
        }
        if let Some(pages) = cmd.page_count {
            if pages == 0 || pages > MAX_TOTAL_PAGES {
                return Err(ApplicationError::validation(format!(
                    "pageCount must be between 1 and {}",
                    MAX_TOTAL_PAGES
                )));
            }
        }

        let created_at = match self.material_repo.find_by_id(&cmd.id).await? {
            Some(existing) => existing.created_at,
            None => Utc::now(),
        };

        let record = MaterialRecord {
            id: cmd.id,
            file_type,
            file_size: cmd.file_size,
            page_count: cmd.page_count,
            created_at,
        };
        self.material_repo.upsert(&record).await?;

        tracing::info!(
            material_id = %record.id,
            file_type = %record.file_type,
            file_size = record.file_size,
            page_count = ?record.page_count,
            "Material registered"
        );

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reading::MaterialId;
    use crate::infrastructure::memory::InMemoryMaterialRepository;

    #[tokio::test]
    async fn test_register_and_reregister_keeps_created_at() {
        let repo = Arc::new(InMemoryMaterialRepository::new());
        let handler = RegisterMaterialHandler::new(repo.clone());

        let first = handler
            .handle(RegisterMaterial {
                id: MaterialId::new("mat-1").unwrap(),
                file_type: "application/pdf".to_string(),
                file_size: 1024,
                page_count: None,
            })
            .await
            .unwrap();

        let second = handler
            .handle(RegisterMaterial {
                id: MaterialId::new("mat-1").unwrap(),
                file_type: "application/pdf".to_string(),
                file_size: 2048,
                page_count: Some(7),
            })
            .await
            .unwrap();

        assert_eq!(first.created_at, second.created_at);
        let stored = repo.find_by_id(&first.id).await.unwrap().unwrap();
        assert_eq!(stored.page_count, Some(7));
        assert_eq!(stored.file_size, 2048);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let handler = RegisterMaterialHandler::new(Arc::new(InMemoryMaterialRepository::new()));
        let err = handler
            .handle(RegisterMaterial {
                id: MaterialId::new("mat-1").unwrap(),
                file_type: " ".to_string(),
                file_size: 1,
                page_count: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_out_of_bounds_page_count() {
        let repo = Arc::new(InMemoryMaterialRepository::new());
        let handler = RegisterMaterialHandler::new(repo.clone());
        let register = |page_count| RegisterMaterial {
            id: MaterialId::new("mat-1").unwrap(),
            file_type: "application/pdf".to_string(),
            file_size: 1024,
            page_count: Some(page_count),
        };

        for pages in [0, MAX_TOTAL_PAGES + 1, u32::MAX] {
            let err = handler.handle(register(pages)).await.unwrap_err();
            assert!(matches!(err, ApplicationError::ValidationError(_)));
        }
        let id = MaterialId::new("mat-1").unwrap();
        assert!(repo.find_by_id(&id).await.unwrap().is_none());

        let record = handler.handle(register(MAX_TOTAL_PAGES)).await.unwrap();
        assert_eq!(record.page_count, Some(MAX_TOTAL_PAGES));
    }
}
