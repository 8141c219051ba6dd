//! Progress Notifier Port - 进度变更推送
//!
//! 替代客户端轮询：会话每次变更后推送给订阅者

use crate::domain::reading::MaterialReadingSession;

/// Progress Notifier Port
pub trait ProgressNotifierPort: Send + Sync {
    /// 会话状态已变更
    fn progress_changed(&self, session: &MaterialReadingSession);

    /// 某页刚刚完成
    fn page_completed(&self, session: &MaterialReadingSession, page: u32);
}

/// 不推送任何事件
pub struct NoopProgressNotifier;

impl ProgressNotifierPort for NoopProgressNotifier {
    fn progress_changed(&self, _session: &MaterialReadingSession) {}

    fn page_completed(&self, _session: &MaterialReadingSession, _page: u32) {}
}
