//! Reading Context - 停留时长策略

use serde::{Deserialize, Serialize};

/// 每页最短阅读时间（秒）
pub const MIN_TIME_REQUIRED_SECS: u64 = 6 * 60;

/// 每页最长阅读时间（秒）
pub const MAX_TIME_ALLOWED_SECS: u64 = 12 * 60;

/// 距离上限多少秒时发出提醒
pub const MAX_TIME_WARNING_SECS: u64 = 60;

/// 检查点提交间隔（秒）
pub const CHECKPOINT_INTERVAL_SECS: u64 = 30;

/// 单个资料的最大页数
pub const MAX_TOTAL_PAGES: u32 = 10_000;

/// 单页可记录的最大累计时长（秒），超过即视为非法检查点
pub const MAX_RECORDED_TIME_SECS: u64 = 24 * 60 * 60;

/// 阅读时长阈值状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdState {
    /// 未达到最短时间
    BelowMinimum,
    /// 处于可完成区间
    WithinWindow,
    /// 接近上限（仅提示）
    ApproachingMaximum,
    /// 已超过上限
    ExceededMaximum,
}

impl ThresholdState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdState::BelowMinimum => "below_minimum",
            ThresholdState::WithinWindow => "within_window",
            ThresholdState::ApproachingMaximum => "approaching_maximum",
            ThresholdState::ExceededMaximum => "exceeded_maximum",
        }
    }

    /// 当前时长是否允许完成该页
    pub fn allows_completion(&self) -> bool {
        matches!(
            self,
            ThresholdState::WithinWindow | ThresholdState::ApproachingMaximum
        )
    }
}

/// 停留时长策略
///
/// 当前所有资料、所有页面共用同一组常量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DwellPolicy {
    pub min_time_required: u64,
    pub max_time_allowed: u64,
}

impl Default for DwellPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl DwellPolicy {
    pub const fn standard() -> Self {
        Self {
            min_time_required: MIN_TIME_REQUIRED_SECS,
            max_time_allowed: MAX_TIME_ALLOWED_SECS,
        }
    }

    /// 开始提醒的时间点
    pub fn warning_at(&self) -> u64 {
        self.max_time_allowed.saturating_sub(MAX_TIME_WARNING_SECS)
    }

    pub fn threshold_state(&self, time_spent: u64) -> ThresholdState {
        if time_spent < self.min_time_required {
            ThresholdState::BelowMinimum
        } else if time_spent > self.max_time_allowed {
            ThresholdState::ExceededMaximum
        } else if time_spent >= self.warning_at() {
            ThresholdState::ApproachingMaximum
        } else {
            ThresholdState::WithinWindow
        }
    }

    /// 距离最短时间还差多少秒
    pub fn remaining_to_minimum(&self, time_spent: u64) -> u64 {
        self.min_time_required.saturating_sub(time_spent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundaries() {
        let policy = DwellPolicy::standard();
        assert_eq!(policy.threshold_state(0), ThresholdState::BelowMinimum);
        assert_eq!(policy.threshold_state(359), ThresholdState::BelowMinimum);
        assert_eq!(policy.threshold_state(360), ThresholdState::WithinWindow);
        assert_eq!(policy.threshold_state(659), ThresholdState::WithinWindow);
        assert_eq!(policy.threshold_state(660), ThresholdState::ApproachingMaximum);
        assert_eq!(policy.threshold_state(720), ThresholdState::ApproachingMaximum);
        assert_eq!(policy.threshold_state(721), ThresholdState::ExceededMaximum);
    }

    #[test]
    fn test_remaining_to_minimum() {
        let policy = DwellPolicy::standard();
        assert_eq!(policy.remaining_to_minimum(300), 60);
        assert_eq!(policy.remaining_to_minimum(400), 0);
    }
}
