//! Download Gate - 下载权限

use serde::{Deserialize, Serialize};

use super::MaterialReadingSession;

/// 下载判定结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadDecision {
    pub can_download: bool,
    pub completed_pages: u32,
    pub total_pages: u32,
    pub reason: String,
}

/// 所有页面逐一完成后才允许下载原始资料
///
/// 只读，可任意频率调用
pub fn can_download(session: &MaterialReadingSession) -> DownloadDecision {
    let completed_pages = session.completed_pages();
    let total_pages = session.total_pages();
    let can_download = completed_pages == total_pages;

    let reason = if can_download {
        format!("All {} pages completed", total_pages)
    } else {
        format!(
            "Complete {} more page(s) to unlock download ({} of {} pages completed)",
            total_pages - completed_pages,
            completed_pages,
            total_pages
        )
    };

    DownloadDecision {
        can_download,
        completed_pages,
        total_pages,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reading::{MaterialId, StudentId, MIN_TIME_REQUIRED_SECS};

    #[test]
    fn test_download_requires_every_page() {
        let mut s = MaterialReadingSession::new(
            MaterialId::new("mat").unwrap(),
            StudentId::new("stu").unwrap(),
            None,
            3,
        )
        .unwrap();

        for page in 1..=2 {
            s.start_page(page).unwrap();
            s.commit_page_time(page, MIN_TIME_REQUIRED_SECS).unwrap();
            s.complete_page(page).unwrap();
        }

        let decision = can_download(&s);
        assert!(!decision.can_download);
        assert_eq!(decision.completed_pages, 2);
        assert_eq!(decision.total_pages, 3);
        assert!(decision.reason.contains("1 more page"));

        s.start_page(3).unwrap();
        s.commit_page_time(3, 500).unwrap();
        s.complete_page(3).unwrap();

        let decision = can_download(&s);
        assert!(decision.can_download);
        assert_eq!(decision.completed_pages, 3);
    }

    #[test]
    fn test_exceeded_page_blocks_download() {
        let mut s = MaterialReadingSession::new(
            MaterialId::new("mat").unwrap(),
            StudentId::new("stu").unwrap(),
            None,
            1,
        )
        .unwrap();
        s.start_page(1).unwrap();
        s.commit_page_time(1, 800).unwrap();
        assert!(s.complete_page(1).is_err());
        assert!(!can_download(&s).can_download);
    }
}
