//! Repository Ports - 出站端口
//!
//! 定义数据持久化的抽象接口
//! 具体实现在 infrastructure 层（SQLite / 内存）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::reading::{MaterialId, MaterialReadingSession, ReadingError, StudentId};

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// 领域规则拒绝了本次变更，存储未被修改
    #[error(transparent)]
    Rejected(#[from] ReadingError),
}

// ============================================================================
// Reading Session Repository
// ============================================================================

/// 会话主键：学生 × 资料
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub student_id: StudentId,
    pub material_id: MaterialId,
}

impl SessionKey {
    pub fn new(student_id: StudentId, material_id: MaterialId) -> Self {
        Self {
            student_id,
            material_id,
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.student_id, self.material_id)
    }
}

/// 对会话的一次原子变更
///
/// 在存储端 "读取 → 校验 → 写入" 的临界区内执行，返回 Err 时不落盘
pub type SessionMutation =
    Box<dyn FnOnce(&mut MaterialReadingSession) -> Result<(), ReadingError> + Send>;

/// Reading Session Repository Port
///
/// 所有写操作都必须以最新存储状态为准重新校验，且 time_spent 以 max 合并写入
#[async_trait]
pub trait ReadingSessionRepositoryPort: Send + Sync {
    /// 查找会话
    async fn find(&self, key: &SessionKey)
        -> Result<Option<MaterialReadingSession>, RepositoryError>;

    /// 不存在时插入，已存在时原样返回已有会话
    async fn insert_if_absent(
        &self,
        session: MaterialReadingSession,
    ) -> Result<MaterialReadingSession, RepositoryError>;

    /// 原子地对会话执行变更并返回变更后的状态
    ///
    /// 会话不存在时返回 `RepositoryError::NotFound`，
    /// 变更被拒绝时返回 `RepositoryError::Rejected`
    async fn update(
        &self,
        key: &SessionKey,
        mutation: SessionMutation,
    ) -> Result<MaterialReadingSession, RepositoryError>;

    /// 某个学生的全部会话
    async fn find_by_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<MaterialReadingSession>, RepositoryError>;
}

// ============================================================================
// Material Repository
// ============================================================================

/// 资料元数据（用于页数解析）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialRecord {
    pub id: MaterialId,
    pub file_type: String,
    pub file_size: u64,
    pub page_count: Option<u32>,
    pub created_at: DateTime<Utc>,
}

/// Material Repository Port
#[async_trait]
pub trait MaterialRepositoryPort: Send + Sync {
    /// 保存或覆盖资料元数据
    async fn upsert(&self, material: &MaterialRecord) -> Result<(), RepositoryError>;

    /// 根据 ID 查找资料
    async fn find_by_id(&self, id: &MaterialId) -> Result<Option<MaterialRecord>, RepositoryError>;
}
