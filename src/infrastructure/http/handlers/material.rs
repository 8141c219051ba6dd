//! Material HTTP Handlers

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::application::{GetPageCount, RegisterMaterial};
use crate::domain::reading::MaterialId;
use crate::infrastructure::http::dto::{
    ApiResponse, MaterialDto, PageCountDto, RegisterMaterialRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

fn parse_material_id(id: String) -> Result<MaterialId, ApiError> {
    MaterialId::new(id).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// 登记资料元数据
pub async fn register_material(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterMaterialRequest>,
) -> Result<Json<ApiResponse<MaterialDto>>, ApiError> {
    let record = state
        .register_material_handler
        .handle(RegisterMaterial {
            id: parse_material_id(req.id)?,
            file_type: req.file_type,
            file_size: req.file_size,
            page_count: req.page_count,
        })
        .await?;

    Ok(Json(ApiResponse::success(MaterialDto::from(record))))
}

/// 资料页数（已知或估算）
pub async fn get_page_count(
    State(state): State<Arc<AppState>>,
    Path(material_id): Path<String>,
) -> Result<Json<ApiResponse<PageCountDto>>, ApiError> {
    let response = state
        .get_page_count_handler
        .handle(GetPageCount {
            material_id: parse_material_id(material_id)?,
        })
        .await?;

    Ok(Json(ApiResponse::success(PageCountDto::from(response))))
}
