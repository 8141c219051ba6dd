//! Reading Commands - 阅读进度相关命令

use crate::application::ports::SessionKey;
use crate::domain::reading::CourseId;

/// 初始化阅读会话（已存在则原样返回）
///
/// total_pages 缺省时从资料目录解析页数
#[derive(Debug, Clone)]
pub struct InitializeReading {
    pub key: SessionKey,
    pub course_id: Option<CourseId>,
    pub total_pages: Option<i64>,
}

/// 开始阅读某页
#[derive(Debug, Clone)]
pub struct StartPageReading {
    pub key: SessionKey,
    pub page: u32,
}

/// 检查点提交（max 合并）
#[derive(Debug, Clone)]
pub struct CommitPageTime {
    pub key: SessionKey,
    pub page: u32,
    pub time_spent: u64,
}

/// 完成某页
#[derive(Debug, Clone)]
pub struct CompletePage {
    pub key: SessionKey,
    pub page: u32,
}

/// 切换当前页
#[derive(Debug, Clone)]
pub struct SetCurrentPage {
    pub key: SessionKey,
    pub page: u32,
}
