//! Reading Queries

use crate::application::ports::SessionKey;
use crate::domain::reading::StudentId;

/// 获取完整阅读会话
#[derive(Debug, Clone)]
pub struct GetReadingSession {
    pub key: SessionKey,
}

/// 获取单页进度
#[derive(Debug, Clone)]
pub struct GetPageProgress {
    pub key: SessionKey,
    pub page: u32,
}

/// 下载权限判定
#[derive(Debug, Clone)]
pub struct CheckDownload {
    pub key: SessionKey,
}

/// 某个学生全部资料的进度
#[derive(Debug, Clone)]
pub struct ListStudentProgress {
    pub student_id: StudentId,
}
