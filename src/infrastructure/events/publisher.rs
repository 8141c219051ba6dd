//! Event Publisher Implementation
//!
//! WebSocket 事件推送实现：每个 学生 × 资料 一个 broadcast 通道

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::application::ports::{ProgressNotifierPort, SessionKey};
use crate::domain::reading::{MaterialReadingSession, ReadingProgress};

/// 默认通道容量
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// WebSocket 事件类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum WsEvent {
    /// 阅读进度变更
    #[serde(rename_all = "camelCase")]
    ProgressUpdated {
        material_id: String,
        student_id: String,
        current_page: u32,
        completed_pages: u32,
        total_pages: u32,
        progress_percentage: u32,
        can_download: bool,
    },
    /// 某页完成
    #[serde(rename_all = "camelCase")]
    PageCompleted {
        material_id: String,
        student_id: String,
        page: u32,
        completed_pages: u32,
        total_pages: u32,
    },
}

impl WsEvent {
    pub fn progress_updated(session: &MaterialReadingSession) -> Self {
        let progress = ReadingProgress::from(session);
        WsEvent::ProgressUpdated {
            material_id: session.material_id().to_string(),
            student_id: session.student_id().to_string(),
            current_page: progress.current_page,
            completed_pages: progress.completed_pages,
            total_pages: progress.total_pages,
            progress_percentage: progress.progress_percentage,
            can_download: progress.can_download,
        }
    }

    pub fn page_completed(session: &MaterialReadingSession, page: u32) -> Self {
        WsEvent::PageCompleted {
            material_id: session.material_id().to_string(),
            student_id: session.student_id().to_string(),
            page,
            completed_pages: session.completed_pages(),
            total_pages: session.total_pages(),
        }
    }
}

/// 事件发布器
pub struct EventPublisher {
    /// 学生 × 资料 -> broadcast sender
    channels: DashMap<SessionKey, broadcast::Sender<WsEvent>>,
    capacity: usize,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅某个会话的事件，通道不存在时创建
    pub fn subscribe(&self, key: &SessionKey) -> broadcast::Receiver<WsEvent> {
        self.channels
            .entry(key.clone())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// 订阅者全部断开后回收通道
    pub fn release(&self, key: &SessionKey) {
        let removed = self
            .channels
            .remove_if(key, |_, sender| sender.receiver_count() == 0);
        if removed.is_some() {
            tracing::debug!(key = %key, "Event channel released");
        }
    }

    /// 当前打开的通道数
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn publish(&self, key: &SessionKey, event: WsEvent) {
        if let Some(sender) = self.channels.get(key) {
            if let Err(e) = sender.send(event) {
                tracing::debug!(
                    key = %key,
                    error = %e,
                    "Failed to publish event (no receivers)"
                );
            }
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

fn key_of(session: &MaterialReadingSession) -> SessionKey {
    SessionKey::new(session.student_id().clone(), session.material_id().clone())
}

impl ProgressNotifierPort for EventPublisher {
    fn progress_changed(&self, session: &MaterialReadingSession) {
        self.publish(&key_of(session), WsEvent::progress_updated(session));
    }

    fn page_completed(&self, session: &MaterialReadingSession, page: u32) {
        self.publish(&key_of(session), WsEvent::page_completed(session, page));
    }
}
