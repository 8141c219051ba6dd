//! Reading Progress - 会话进度摘要

use serde::{Deserialize, Serialize};

use super::{download, MaterialReadingSession};

/// 渲染 "X / Y 页" 所需的进度摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingProgress {
    pub completed_pages: u32,
    pub total_pages: u32,
    pub progress_percentage: u32,
    pub total_time_spent: u64,
    pub can_download: bool,
    pub current_page: u32,
}

impl From<&MaterialReadingSession> for ReadingProgress {
    fn from(session: &MaterialReadingSession) -> Self {
        let completed_pages = session.completed_pages();
        let total_pages = session.total_pages();
        let progress_percentage =
            ((completed_pages as f64 / total_pages as f64) * 100.0).round() as u32;

        Self {
            completed_pages,
            total_pages,
            progress_percentage,
            total_time_spent: session.total_time_spent(),
            can_download: download::can_download(session).can_download,
            current_page: session.current_page(),
        }
    }
}
