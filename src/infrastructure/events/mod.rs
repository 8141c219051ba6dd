//! Events - 进度变更事件推送

mod publisher;

pub use publisher::{EventPublisher, WsEvent, DEFAULT_CHANNEL_CAPACITY};
