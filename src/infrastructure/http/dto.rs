//! Data Transfer Objects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::{DownloadStatus, MaterialProgress, MaterialRecord, PageCountResponse};
use crate::domain::reading::{
    DownloadDecision, MaterialReadingSession, PagePhase, PageState, ReadingProgress,
    ThresholdState,
};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Reading DTOs
// ============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeReadingRequest {
    #[serde(default)]
    pub total_pages: Option<i64>,
    #[serde(default)]
    pub course_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitPageTimeRequest {
    pub time_spent: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCurrentPageRequest {
    pub page: u32,
}

/// 单页状态（附带派生的阶段与阈值状态）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDto {
    #[serde(flatten)]
    pub state: PageState,
    pub phase: PagePhase,
    pub threshold: ThresholdState,
}

impl From<&PageState> for PageDto {
    fn from(page: &PageState) -> Self {
        Self {
            state: page.clone(),
            phase: page.phase(),
            threshold: page.threshold_state(),
        }
    }
}

/// 阅读会话
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    pub id: String,
    pub material_id: String,
    pub student_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    pub total_pages: u32,
    pub current_page: u32,
    pub completed_pages: u32,
    pub pages: Vec<PageDto>,
    pub progress: ReadingProgress,
    pub session_start_time: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl From<&MaterialReadingSession> for SessionDto {
    fn from(session: &MaterialReadingSession) -> Self {
        Self {
            id: session.id().to_string(),
            material_id: session.material_id().to_string(),
            student_id: session.student_id().to_string(),
            course_id: session.course_id().map(|c| c.to_string()),
            total_pages: session.total_pages(),
            current_page: session.current_page(),
            completed_pages: session.completed_pages(),
            pages: session.pages().iter().map(PageDto::from).collect(),
            progress: ReadingProgress::from(session),
            session_start_time: session.session_start_time(),
            last_activity: session.last_activity(),
        }
    }
}

/// 下载判定
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadDto {
    #[serde(flatten)]
    pub decision: DownloadDecision,
    pub progress: ReadingProgress,
}

impl From<DownloadStatus> for DownloadDto {
    fn from(status: DownloadStatus) -> Self {
        Self {
            decision: status.decision,
            progress: status.progress,
        }
    }
}

/// 学生进度列表条目
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialProgressDto {
    pub material_id: String,
    #[serde(flatten)]
    pub progress: ReadingProgress,
}

impl From<MaterialProgress> for MaterialProgressDto {
    fn from(item: MaterialProgress) -> Self {
        Self {
            material_id: item.material_id.to_string(),
            progress: item.progress,
        }
    }
}

// ============================================================================
// Material DTOs
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterMaterialRequest {
    pub id: String,
    pub file_type: String,
    pub file_size: u64,
    #[serde(default)]
    pub page_count: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialDto {
    pub id: String,
    pub file_type: String,
    pub file_size: u64,
    pub page_count: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl From<MaterialRecord> for MaterialDto {
    fn from(record: MaterialRecord) -> Self {
        Self {
            id: record.id.to_string(),
            file_type: record.file_type,
            file_size: record.file_size,
            page_count: record.page_count,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCountDto {
    pub material_id: String,
    pub page_count: u32,
    pub estimated: bool,
    pub file_type: String,
    pub file_size: u64,
}

impl From<PageCountResponse> for PageCountDto {
    fn from(resp: PageCountResponse) -> Self {
        Self {
            material_id: resp.material.id.to_string(),
            page_count: resp.page_count.pages(),
            estimated: resp.page_count.is_estimated(),
            file_type: resp.material.file_type,
            file_size: resp.material.file_size,
        }
    }
}
