//! Reading Client - 阅读端
//!
//! - ProgressClient: 进度服务 HTTP 客户端
//! - ReadingDriver: 持有 PageTimer 的计时驱动任务

mod progress_client;
mod reading_driver;

pub use progress_client::{ClientError, ProgressApi, ProgressClient, ProgressClientConfig};
pub use reading_driver::{DriverError, ReaderCommand, ReaderHandle, ReaderSnapshot, ReadingDriver};
