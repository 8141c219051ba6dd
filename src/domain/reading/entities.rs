//! Reading Context - Entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DwellPolicy, ThresholdState};

/// 页面阅读阶段
///
/// not_started → active ⇄ paused → completed（终态）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagePhase {
    NotStarted,
    Active,
    Paused,
    Completed,
}

impl PagePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PagePhase::NotStarted => "not_started",
            PagePhase::Active => "active",
            PagePhase::Paused => "paused",
            PagePhase::Completed => "completed",
        }
    }
}

/// 单页阅读状态
///
/// 不变量:
/// - page_number 从 1 开始且不可变
/// - is_completed 为 true 时 time_spent >= min_time_required
/// - time_spent 只增不减
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageState {
    page_number: u32,
    time_spent: u64,
    is_completed: bool,
    can_proceed: bool,
    min_time_required: u64,
    max_time_allowed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_time: Option<DateTime<Utc>>,
}

impl PageState {
    pub fn new(page_number: u32, policy: DwellPolicy) -> Self {
        Self {
            page_number,
            time_spent: 0,
            is_completed: false,
            can_proceed: page_number == 1,
            min_time_required: policy.min_time_required,
            max_time_allowed: policy.max_time_allowed,
            start_time: None,
            end_time: None,
        }
    }

    /// 从持久化数据重建
    pub fn restore(
        page_number: u32,
        time_spent: u64,
        is_completed: bool,
        policy: DwellPolicy,
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            page_number,
            time_spent,
            is_completed,
            can_proceed: page_number == 1,
            min_time_required: policy.min_time_required,
            max_time_allowed: policy.max_time_allowed,
            start_time,
            end_time,
        }
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn time_spent(&self) -> u64 {
        self.time_spent
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub fn can_proceed(&self) -> bool {
        self.can_proceed
    }

    pub fn min_time_required(&self) -> u64 {
        self.min_time_required
    }

    pub fn max_time_allowed(&self) -> u64 {
        self.max_time_allowed
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn policy(&self) -> DwellPolicy {
        DwellPolicy {
            min_time_required: self.min_time_required,
            max_time_allowed: self.max_time_allowed,
        }
    }

    pub fn threshold_state(&self) -> ThresholdState {
        self.policy().threshold_state(self.time_spent)
    }

    pub fn phase(&self) -> PagePhase {
        if self.is_completed {
            PagePhase::Completed
        } else if self.is_active() {
            PagePhase::Active
        } else if self.start_time.is_some() || self.time_spent > 0 {
            PagePhase::Paused
        } else {
            PagePhase::NotStarted
        }
    }

    /// 是否有尚未结束的阅读区间
    pub fn is_active(&self) -> bool {
        !self.is_completed && self.start_time.is_some() && self.end_time.is_none()
    }

    /// 合并新的时长，取较大值，防止乱序或过期写入导致回退
    ///
    /// 返回是否发生变化
    pub(super) fn merge_time(&mut self, incoming: u64) -> bool {
        if incoming > self.time_spent {
            self.time_spent = incoming;
            true
        } else {
            false
        }
    }

    pub(super) fn open_interval(&mut self, now: DateTime<Utc>) {
        self.start_time = Some(now);
        self.end_time = None;
    }

    pub(super) fn close_interval(&mut self, now: DateTime<Utc>) {
        if self.start_time.is_some() && self.end_time.is_none() {
            self.end_time = Some(now);
        }
    }

    pub(super) fn mark_completed(&mut self, now: DateTime<Utc>) {
        self.close_interval(now);
        self.is_completed = true;
    }

    pub(super) fn set_can_proceed(&mut self, can_proceed: bool) {
        self.can_proceed = can_proceed;
    }
}
