//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod progress_notifier;
mod repositories;

pub use progress_notifier::{NoopProgressNotifier, ProgressNotifierPort};
pub use repositories::{
    MaterialRecord, MaterialRepositoryPort, ReadingSessionRepositoryPort, RepositoryError,
    SessionKey, SessionMutation,
};
