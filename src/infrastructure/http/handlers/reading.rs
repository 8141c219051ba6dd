//! Reading Progress HTTP Handlers

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::application::{
    CheckDownload, CommitPageTime, CompletePage, GetPageProgress,
    GetReadingSession, InitializeReading, ListStudentProgress, SessionKey, SetCurrentPage,
    StartPageReading,
};
use crate::domain::reading::{CourseId, MaterialId};
use crate::infrastructure::http::dto::{
    ApiResponse, CommitPageTimeRequest, DownloadDto, InitializeReadingRequest,
    MaterialProgressDto, PageDto, SessionDto, SetCurrentPageRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::extract::StudentIdentity;
use crate::infrastructure::http::state::AppState;

type SessionResult = Result<Json<ApiResponse<SessionDto>>, ApiError>;

fn session_key(student: StudentIdentity, material_id: String) -> Result<SessionKey, ApiError> {
    let material_id =
        MaterialId::new(material_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(SessionKey::new(student.0, material_id))
}

/// 初始化（或获取已有）阅读会话
pub async fn initialize_reading(
    State(state): State<Arc<AppState>>,
    student: StudentIdentity,
    Path(material_id): Path<String>,
    Json(req): Json<InitializeReadingRequest>,
) -> SessionResult {
    let key = session_key(student, material_id)?;
    let course_id = req
        .course_id
        .map(CourseId::new)
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let session = state
        .initialize_handler
        .handle(InitializeReading {
            key,
            course_id,
            total_pages: req.total_pages,
        })
        .await?;

    Ok(Json(ApiResponse::success(SessionDto::from(&session))))
}

/// 获取阅读会话
pub async fn get_reading_session(
    State(state): State<Arc<AppState>>,
    student: StudentIdentity,
    Path(material_id): Path<String>,
) -> SessionResult {
    let key = session_key(student, material_id)?;
    let session = state
        .get_session_handler
        .handle(GetReadingSession { key })
        .await?;

    Ok(Json(ApiResponse::success(SessionDto::from(&session))))
}

/// 开始阅读某页
pub async fn start_page(
    State(state): State<Arc<AppState>>,
    student: StudentIdentity,
    Path((material_id, page)): Path<(String, u32)>,
) -> SessionResult {
    let key = session_key(student, material_id)?;
    let session = state
        .start_page_handler
        .handle(StartPageReading { key, page })
        .await?;

    Ok(Json(ApiResponse::success(SessionDto::from(&session))))
}

/// 检查点：提交某页累计阅读时间
pub async fn commit_page_time(
    State(state): State<Arc<AppState>>,
    student: StudentIdentity,
    Path((material_id, page)): Path<(String, u32)>,
    Json(req): Json<CommitPageTimeRequest>,
) -> SessionResult {
    let key = session_key(student, material_id)?;
    let session = state
        .commit_time_handler
        .handle(CommitPageTime {
            key,
            page,
            time_spent: req.time_spent,
        })
        .await?;

    Ok(Json(ApiResponse::success(SessionDto::from(&session))))
}

/// 完成某页
pub async fn complete_page(
    State(state): State<Arc<AppState>>,
    student: StudentIdentity,
    Path((material_id, page)): Path<(String, u32)>,
) -> SessionResult {
    let key = session_key(student, material_id)?;
    let session = state
        .complete_page_handler
        .handle(CompletePage { key, page })
        .await?;

    Ok(Json(ApiResponse::success(SessionDto::from(&session))))
}

/// 切换当前页
pub async fn set_current_page(
    State(state): State<Arc<AppState>>,
    student: StudentIdentity,
    Path(material_id): Path<String>,
    Json(req): Json<SetCurrentPageRequest>,
) -> SessionResult {
    let key = session_key(student, material_id)?;
    let session = state
        .set_current_page_handler
        .handle(SetCurrentPage {
            key,
            page: req.page,
        })
        .await?;

    Ok(Json(ApiResponse::success(SessionDto::from(&session))))
}

/// 轮询用的阅读进度（完整会话，含 `progress` 摘要）
pub async fn get_reading_progress(
    State(state): State<Arc<AppState>>,
    student: StudentIdentity,
    Path(material_id): Path<String>,
) -> SessionResult {
    let key = session_key(student, material_id)?;
    let session = state
        .get_session_handler
        .handle(GetReadingSession { key })
        .await?;

    Ok(Json(ApiResponse::success(SessionDto::from(&session))))
}

/// 单页进度
pub async fn get_page_progress(
    State(state): State<Arc<AppState>>,
    student: StudentIdentity,
    Path((material_id, page)): Path<(String, u32)>,
) -> Result<Json<ApiResponse<PageDto>>, ApiError> {
    let key = session_key(student, material_id)?;
    let page = state
        .get_page_progress_handler
        .handle(GetPageProgress { key, page })
        .await?;

    Ok(Json(ApiResponse::success(PageDto::from(&page))))
}

/// 下载权限
pub async fn can_download(
    State(state): State<Arc<AppState>>,
    student: StudentIdentity,
    Path(material_id): Path<String>,
) -> Result<Json<ApiResponse<DownloadDto>>, ApiError> {
    let key = session_key(student, material_id)?;
    let status = state
        .check_download_handler
        .handle(CheckDownload { key })
        .await?;

    Ok(Json(ApiResponse::success(DownloadDto::from(status))))
}

/// 当前学生全部资料的进度
pub async fn list_reading_progress(
    State(state): State<Arc<AppState>>,
    student: StudentIdentity,
) -> Result<Json<ApiResponse<Vec<MaterialProgressDto>>>, ApiError> {
    let items = state
        .list_progress_handler
        .handle(ListStudentProgress {
            student_id: student.0,
        })
        .await?;

    Ok(Json(ApiResponse::success(
        items.into_iter().map(MaterialProgressDto::from).collect(),
    )))
}
