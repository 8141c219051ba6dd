//! Reading Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{ReadingSessionRepositoryPort, SessionKey};
use crate::application::queries::{
    CheckDownload, GetPageProgress, GetReadingSession, ListStudentProgress,
};
use crate::domain::reading::{
    download, DownloadDecision, MaterialId, MaterialReadingSession, PageState, ReadingProgress,
};

// ============================================================================
// Response DTOs
// ============================================================================

/// 下载判定响应
#[derive(Debug, Clone)]
pub struct DownloadStatus {
    pub decision: DownloadDecision,
    pub progress: ReadingProgress,
}

/// 单个资料的进度条目
#[derive(Debug, Clone)]
pub struct MaterialProgress {
    pub material_id: MaterialId,
    pub progress: ReadingProgress,
}

async fn load(
    repo: &dyn ReadingSessionRepositoryPort,
    key: &SessionKey,
) -> Result<MaterialReadingSession, ApplicationError> {
    repo.find(key)
        .await?
        .ok_or_else(|| ApplicationError::not_found("Reading session", key))
}

// ============================================================================
// Handlers
// ============================================================================

/// GetReadingSession Handler
pub struct GetReadingSessionHandler {
    session_repo: Arc<dyn ReadingSessionRepositoryPort>,
}

impl GetReadingSessionHandler {
    pub fn new(session_repo: Arc<dyn ReadingSessionRepositoryPort>) -> Self {
        Self { session_repo }
    }

    pub async fn handle(
        &self,
        query: GetReadingSession,
    ) -> Result<MaterialReadingSession, ApplicationError> {
        load(self.session_repo.as_ref(), &query.key).await
    }
}

/// GetPageProgress Handler
pub struct GetPageProgressHandler {
    session_repo: Arc<dyn ReadingSessionRepositoryPort>,
}

impl GetPageProgressHandler {
    pub fn new(session_repo: Arc<dyn ReadingSessionRepositoryPort>) -> Self {
        Self { session_repo }
    }

    pub async fn handle(&self, query: GetPageProgress) -> Result<PageState, ApplicationError> {
        let session = load(self.session_repo.as_ref(), &query.key).await?;
        Ok(session.page(query.page)?.clone())
    }
}

/// CheckDownload Handler
///
/// 只读，客户端可以高频轮询
pub struct CheckDownloadHandler {
    session_repo: Arc<dyn ReadingSessionRepositoryPort>,
}

impl CheckDownloadHandler {
    pub fn new(session_repo: Arc<dyn ReadingSessionRepositoryPort>) -> Self {
        Self { session_repo }
    }

    pub async fn handle(&self, query: CheckDownload) -> Result<DownloadStatus, ApplicationError> {
        let session = load(self.session_repo.as_ref(), &query.key).await?;
        Ok(DownloadStatus {
            decision: download::can_download(&session),
            progress: ReadingProgress::from(&session),
        })
    }
}

/// ListStudentProgress Handler
pub struct ListStudentProgressHandler {
    session_repo: Arc<dyn ReadingSessionRepositoryPort>,
}

impl ListStudentProgressHandler {
    pub fn new(session_repo: Arc<dyn ReadingSessionRepositoryPort>) -> Self {
        Self { session_repo }
    }

    pub async fn handle(
        &self,
        query: ListStudentProgress,
    ) -> Result<Vec<MaterialProgress>, ApplicationError> {
        let sessions = self.session_repo.find_by_student(&query.student_id).await?;
        Ok(sessions
            .iter()
            .map(|s| MaterialProgress {
                material_id: s.material_id().clone(),
                progress: ReadingProgress::from(s),
            })
            .collect())
    }
}
