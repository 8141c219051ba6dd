//! Navigation Guard - 顺序解锁策略
//!
//! 纯函数，每次都从会话状态重新计算

use super::MaterialReadingSession;

/// 学生现在能否进入 `page`
///
/// - 第 1 页总是可以进入
/// - 当前页可以重复进入
/// - 其余页面要求前一页已完成（因此回退总是允许）
pub fn can_enter(session: &MaterialReadingSession, page: u32) -> bool {
    if page == 0 || page > session.total_pages() {
        return false;
    }
    if page == 1 || page == session.current_page() {
        return true;
    }
    session
        .page(page - 1)
        .map(|prev| prev.is_completed())
        .unwrap_or(false)
}

/// "下一页" 按钮可以前往的页码；不可前进时返回当前页
pub fn next_available_page(session: &MaterialReadingSession) -> u32 {
    let next = session.current_page() + 1;
    if can_enter(session, next) {
        next
    } else {
        session.current_page()
    }
}

/// 当前所有可进入的页码
pub fn navigable_pages(session: &MaterialReadingSession) -> Vec<u32> {
    (1..=session.total_pages())
        .filter(|&page| can_enter(session, page))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reading::{MaterialId, StudentId, MIN_TIME_REQUIRED_SECS};

    fn session(total_pages: i64) -> MaterialReadingSession {
        MaterialReadingSession::new(
            MaterialId::new("mat").unwrap(),
            StudentId::new("stu").unwrap(),
            None,
            total_pages,
        )
        .unwrap()
    }

    #[test]
    fn test_fresh_session_only_first_page() {
        let s = session(3);
        assert!(can_enter(&s, 1));
        assert!(!can_enter(&s, 2));
        assert!(!can_enter(&s, 3));
        assert!(!can_enter(&s, 0));
        assert!(!can_enter(&s, 4));
        assert_eq!(next_available_page(&s), 1);
        assert_eq!(navigable_pages(&s), vec![1]);
    }

    #[test]
    fn test_completion_unlocks_successor() {
        let mut s = session(3);
        s.start_page(1).unwrap();
        s.commit_page_time(1, MIN_TIME_REQUIRED_SECS).unwrap();
        s.complete_page(1).unwrap();

        assert!(can_enter(&s, 2));
        assert!(!can_enter(&s, 3));
        assert_eq!(navigable_pages(&s), vec![1, 2]);
    }

    #[test]
    fn test_next_available_on_last_page() {
        let mut s = session(2);
        for page in 1..=2 {
            s.start_page(page).unwrap();
            s.commit_page_time(page, MIN_TIME_REQUIRED_SECS).unwrap();
            s.complete_page(page).unwrap();
        }
        assert_eq!(s.current_page(), 2);
        assert_eq!(next_available_page(&s), 2);
    }

    #[test]
    fn test_next_available_after_going_back() {
        let mut s = session(3);
        s.start_page(1).unwrap();
        s.commit_page_time(1, MIN_TIME_REQUIRED_SECS).unwrap();
        s.complete_page(1).unwrap();
        s.set_current_page(1).unwrap();

        assert_eq!(next_available_page(&s), 2);
    }
}
