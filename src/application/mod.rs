//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（Repository、ProgressNotifier）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    // Reading commands
    CommitPageTime,
    CompletePage,
    InitializeReading,
    SetCurrentPage,
    StartPageReading,
    // Material commands
    RegisterMaterial,
    // Handlers
    handlers::{
        CommitPageTimeHandler, CompletePageHandler, InitializeReadingHandler,
        RegisterMaterialHandler, SetCurrentPageHandler, StartPageReadingHandler,
    },
};

pub use error::ApplicationError;

pub use ports::{
    // Repositories
    MaterialRecord,
    MaterialRepositoryPort,
    ReadingSessionRepositoryPort,
    RepositoryError,
    SessionKey,
    SessionMutation,
    // Progress notifier
    NoopProgressNotifier,
    ProgressNotifierPort,
};

pub use queries::{
    // Reading queries
    CheckDownload,
    GetPageProgress,
    GetReadingSession,
    ListStudentProgress,
    // Material queries
    GetPageCount,
    // Handlers
    handlers::{
        CheckDownloadHandler, DownloadStatus, GetPageCountHandler, GetPageProgressHandler,
        GetReadingSessionHandler, ListStudentProgressHandler,
        MaterialProgress, PageCountResponse,
    },
};
