//! Reading Context - Aggregate Root

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    navigation, CourseId, DwellPolicy, MaterialId, PageState, ReadingError, ReadingSessionId,
    StudentId, MAX_RECORDED_TIME_SECS, MAX_TOTAL_PAGES,
};

/// 资料阅读会话聚合根（每个 学生 × 资料 一个）
///
/// 不变量:
/// - pages.len() == total_pages >= 1，页码从 1 开始
/// - 1 <= current_page <= total_pages
/// - 页面 p > 1 只有在 p-1 已完成时才能进入
/// - 已完成页面的 time_spent >= min_time_required
/// - completed_pages 单调不减
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialReadingSession {
    id: ReadingSessionId,
    material_id: MaterialId,
    student_id: StudentId,
    course_id: Option<CourseId>,
    total_pages: u32,
    pages: Vec<PageState>,
    current_page: u32,
    completed_pages: u32,
    session_start_time: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

impl MaterialReadingSession {
    /// 创建新会话
    pub fn new(
        material_id: MaterialId,
        student_id: StudentId,
        course_id: Option<CourseId>,
        total_pages: i64,
    ) -> Result<Self, ReadingError> {
        let total_pages = validate_page_count(total_pages)?;
        let policy = DwellPolicy::standard();
        let now = Utc::now();

        Ok(Self {
            id: ReadingSessionId::new(),
            material_id,
            student_id,
            course_id,
            total_pages,
            pages: (1..=total_pages).map(|n| PageState::new(n, policy)).collect(),
            current_page: 1,
            completed_pages: 0,
            session_start_time: now,
            last_activity: now,
        })
    }

    /// 从持久化数据重建
    ///
    /// pages 按页码排序后必须正好覆盖 1..=total_pages
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: ReadingSessionId,
        material_id: MaterialId,
        student_id: StudentId,
        course_id: Option<CourseId>,
        current_page: u32,
        mut pages: Vec<PageState>,
        session_start_time: DateTime<Utc>,
        last_activity: DateTime<Utc>,
    ) -> Result<Self, ReadingError> {
        let total_pages = validate_page_count(pages.len() as i64)?;
        pages.sort_by_key(|p| p.page_number());
        for (expected, page) in (1..=total_pages).zip(pages.iter()) {
            if page.page_number() != expected {
                return Err(ReadingError::OutOfRange {
                    page: page.page_number(),
                    total_pages,
                });
            }
        }

        let mut session = Self {
            id,
            material_id,
            student_id,
            course_id,
            total_pages,
            pages,
            current_page: current_page.clamp(1, total_pages),
            completed_pages: 0,
            session_start_time,
            last_activity,
        };
        session.recompute();
        Ok(session)
    }

    // ========== Commands ==========

    /// 开始阅读某一页
    ///
    /// 同一时刻最多一个页面计时：其余页面未结束的区间会被关闭。
    /// 已完成的页面只切换 current_page，不再开启计时区间。
    pub fn start_page(&mut self, page: u32) -> Result<(), ReadingError> {
        self.ensure_enterable(page)?;
        let now = Utc::now();

        for other in self.pages.iter_mut().filter(|p| p.page_number() != page) {
            other.close_interval(now);
        }

        let state = self.page_mut(page)?;
        if !state.is_completed() {
            state.open_interval(now);
        }

        self.current_page = page;
        self.last_activity = now;
        Ok(())
    }

    /// 检查点提交：取 max(existing, incoming)
    ///
    /// 返回是否有变化
    pub fn commit_page_time(&mut self, page: u32, time_spent: u64) -> Result<bool, ReadingError> {
        if time_spent > MAX_RECORDED_TIME_SECS {
            return Err(ReadingError::InvalidTimeSpent { page, time_spent });
        }
        let changed = self.page_mut(page)?.merge_time(time_spent);
        self.last_activity = Utc::now();
        Ok(changed)
    }

    /// 结束某页当前的计时区间
    pub fn pause_page(&mut self, page: u32) -> Result<(), ReadingError> {
        let now = Utc::now();
        self.page_mut(page)?.close_interval(now);
        self.last_activity = now;
        Ok(())
    }

    /// 完成某页
    ///
    /// 基于已存储的 time_spent 重新校验阈值。已完成的页面重复提交为幂等操作，
    /// 返回 false，不会重复计数。
    pub fn complete_page(&mut self, page: u32) -> Result<bool, ReadingError> {
        let state = self.page(page)?;
        if state.is_completed() {
            return Ok(false);
        }

        if page > 1 && !self.page(page - 1)?.is_completed() {
            return Err(ReadingError::SequenceViolation {
                page,
                required: page - 1,
            });
        }

        let policy = state.policy();
        let time_spent = state.time_spent();
        if time_spent < policy.min_time_required {
            return Err(ReadingError::ThresholdNotMet {
                page,
                remaining: policy.remaining_to_minimum(time_spent),
            });
        }
        if time_spent > policy.max_time_allowed {
            return Err(ReadingError::MaximumExceeded {
                page,
                max_time_allowed: policy.max_time_allowed,
            });
        }

        let now = Utc::now();
        self.page_mut(page)?.mark_completed(now);
        self.recompute();

        if page == self.current_page && page < self.total_pages {
            self.current_page = page + 1;
        }
        self.last_activity = now;
        Ok(true)
    }

    /// 切换当前页
    pub fn set_current_page(&mut self, page: u32) -> Result<(), ReadingError> {
        self.ensure_enterable(page)?;
        self.current_page = page;
        self.last_activity = Utc::now();
        Ok(())
    }

    // ========== Queries ==========

    pub fn page(&self, page: u32) -> Result<&PageState, ReadingError> {
        self.check_range(page)?;
        Ok(&self.pages[(page - 1) as usize])
    }

    pub fn id(&self) -> &ReadingSessionId {
        &self.id
    }

    pub fn material_id(&self) -> &MaterialId {
        &self.material_id
    }

    pub fn student_id(&self) -> &StudentId {
        &self.student_id
    }

    pub fn course_id(&self) -> Option<&CourseId> {
        self.course_id.as_ref()
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn pages(&self) -> &[PageState] {
        &self.pages
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn completed_pages(&self) -> u32 {
        self.completed_pages
    }

    pub fn session_start_time(&self) -> DateTime<Utc> {
        self.session_start_time
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// 所有页面累计阅读时间
    pub fn total_time_spent(&self) -> u64 {
        self.pages
            .iter()
            .fold(0u64, |total, p| total.saturating_add(p.time_spent()))
    }

    /// 正在计时的页面
    pub fn active_page(&self) -> Option<u32> {
        self.pages
            .iter()
            .find(|p| p.is_active())
            .map(PageState::page_number)
    }

    // ========== Internals ==========

    fn check_range(&self, page: u32) -> Result<(), ReadingError> {
        if page == 0 || page > self.total_pages {
            return Err(ReadingError::OutOfRange {
                page,
                total_pages: self.total_pages,
            });
        }
        Ok(())
    }

    fn ensure_enterable(&self, page: u32) -> Result<(), ReadingError> {
        self.check_range(page)?;
        if !navigation::can_enter(self, page) {
            return Err(ReadingError::SequenceViolation {
                page,
                required: page - 1,
            });
        }
        Ok(())
    }

    fn page_mut(&mut self, page: u32) -> Result<&mut PageState, ReadingError> {
        self.check_range(page)?;
        Ok(&mut self.pages[(page - 1) as usize])
    }

    /// 重新计算 completed_pages 与每页的 can_proceed
    fn recompute(&mut self) {
        let mut previous_completed = true;
        let mut completed = 0;
        for page in self.pages.iter_mut() {
            page.set_can_proceed(previous_completed);
            previous_completed = page.is_completed();
            if previous_completed {
                completed += 1;
            }
        }
        self.completed_pages = completed;
    }
}

fn validate_page_count(total_pages: i64) -> Result<u32, ReadingError> {
    if total_pages < 1 || total_pages > MAX_TOTAL_PAGES as i64 {
        return Err(ReadingError::InvalidPageCount(total_pages));
    }
    Ok(total_pages as u32)
}
