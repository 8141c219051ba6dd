//! Reading Context - 资料分页阅读限界上下文
//!
//! 职责:
//! - MaterialReadingSession 聚合（PageProgressStore 的权威记录）
//! - PageTimer 单页计时状态机
//! - NavigationGuard 顺序解锁
//! - DownloadGate 下载权限

mod aggregate;
mod entities;
mod errors;
mod policy;
mod summary;
mod timer;
mod value_objects;

pub mod download;
pub mod navigation;

pub use aggregate::MaterialReadingSession;
pub use download::DownloadDecision;
pub use entities::{PagePhase, PageState};
pub use errors::ReadingError;
pub use policy::{
    DwellPolicy, ThresholdState, CHECKPOINT_INTERVAL_SECS, MAX_RECORDED_TIME_SECS,
    MAX_TIME_ALLOWED_SECS, MAX_TIME_WARNING_SECS, MAX_TOTAL_PAGES, MIN_TIME_REQUIRED_SECS,
};
pub use summary::ReadingProgress;
pub use timer::{Checkpoint, PageTimer, TickOutcome, TimerPhase};
pub use value_objects::{CourseId, MaterialId, ReadingSessionId, StudentId};
