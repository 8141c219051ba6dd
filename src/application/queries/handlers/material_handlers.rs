//! Material Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{MaterialRecord, MaterialRepositoryPort};
use crate::application::queries::GetPageCount;
use crate::domain::material::PageCount;

/// 页数响应
#[derive(Debug, Clone)]
pub struct PageCountResponse {
    pub material: MaterialRecord,
    pub page_count: PageCount,
}

/// GetPageCount Handler
pub struct GetPageCountHandler {
    material_repo: Arc<dyn MaterialRepositoryPort>,
}

impl GetPageCountHandler {
    pub fn new(material_repo: Arc<dyn MaterialRepositoryPort>) -> Self {
        Self { material_repo }
    }

    pub async fn handle(&self, query: GetPageCount) -> Result<PageCountResponse, ApplicationError> {
        let material = self
            .material_repo
            .find_by_id(&query.material_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Material", &query.material_id))?;

        let page_count =
            PageCount::resolve(material.page_count, material.file_size, &material.file_type);

        Ok(PageCountResponse {
            material,
            page_count,
        })
    }
}
