//! Reading Context - Errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadingError {
    #[error("Reading session not found for material {0}")]
    NotFound(String),

    #[error("Invalid page count: {0} (a material has between 1 and 10000 pages)")]
    InvalidPageCount(i64),

    #[error("Invalid reading time for page {page}: {time_spent} seconds")]
    InvalidTimeSpent { page: u32, time_spent: u64 },

    #[error("No page is being read; start a page first")]
    NoActivePage,

    #[error("Page {page} is out of range (material has {total_pages} pages)")]
    OutOfRange { page: u32, total_pages: u32 },

    #[error("Page {page} is locked: complete page {required} first")]
    SequenceViolation { page: u32, required: u32 },

    #[error("Page {page} needs {remaining} more seconds of reading before it can be completed")]
    ThresholdNotMet { page: u32, remaining: u64 },

    #[error("Page {page} exceeded the maximum reading time of {max_time_allowed} seconds and can no longer be completed")]
    MaximumExceeded { page: u32, max_time_allowed: u64 },
}

impl ReadingError {
    /// 用户可直接处理的错误（等待或先完成上一页）
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            ReadingError::ThresholdNotMet { .. } | ReadingError::SequenceViolation { .. }
        )
    }
}
