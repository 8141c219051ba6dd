//! Page Timer - 单页阅读计时状态机
//!
//! 纯状态机，不持有时钟：由外部调度器每秒调用一次 `tick()`。
//! 计时结果以 `Checkpoint` 的形式交给调用方提交。
//!
//! not_started → active ⇄ paused → completed（终态）

use serde::Serialize;

use super::{DwellPolicy, ReadingError, ThresholdState, CHECKPOINT_INTERVAL_SECS};

/// 计时器阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    NotStarted,
    Active,
    Paused,
    Completed,
}

/// 需要提交给进度存储的累计时长
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub page: u32,
    pub time_spent: u64,
}

/// 单次 tick 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub time_spent: u64,
    pub threshold: ThresholdState,
    /// 首次进入 approaching_maximum 时为 true
    pub warning_raised: bool,
    /// 到达检查点间隔时需要提交
    pub checkpoint: Option<Checkpoint>,
}

/// 单页计时器
///
/// 同一时刻只为一个页面计时；切换页面会隐式暂停上一页
#[derive(Debug, Clone)]
pub struct PageTimer {
    policy: DwellPolicy,
    page: Option<u32>,
    phase: TimerPhase,
    time_spent: u64,
    last_committed: u64,
    warned: bool,
}

impl Default for PageTimer {
    fn default() -> Self {
        Self::new(DwellPolicy::standard())
    }
}

impl PageTimer {
    pub fn new(policy: DwellPolicy) -> Self {
        Self {
            policy,
            page: None,
            phase: TimerPhase::NotStarted,
            time_spent: 0,
            last_committed: 0,
            warned: false,
        }
    }

    /// 开始（或继续）为 `page` 计时
    ///
    /// `carried` 为已存储的累计时长，用于跨会话恢复；同一页面多次 start/pause 会累加。
    /// 若另一页面正在计时，会先暂停它并返回其检查点。
    pub fn start(&mut self, page: u32, carried: u64) -> Option<Checkpoint> {
        if self.page == Some(page) {
            match self.phase {
                TimerPhase::Active | TimerPhase::Completed => return None,
                TimerPhase::NotStarted | TimerPhase::Paused => {
                    self.time_spent = self.time_spent.max(carried);
                    self.phase = TimerPhase::Active;
                    return None;
                }
            }
        }

        let previous = self.pause();

        self.page = Some(page);
        self.phase = TimerPhase::Active;
        self.time_spent = carried;
        self.last_committed = carried;
        self.warned = carried >= self.policy.warning_at();

        previous
    }

    /// 推进 1 秒
    ///
    /// 非计时状态下不累加时间，也不产生检查点
    pub fn tick(&mut self) -> TickOutcome {
        let mut checkpoint = None;
        let mut warning_raised = false;

        if let (TimerPhase::Active, Some(page)) = (self.phase, self.page) {
            self.time_spent += 1;

            if self.time_spent - self.last_committed >= CHECKPOINT_INTERVAL_SECS {
                self.last_committed = self.time_spent;
                checkpoint = Some(Checkpoint {
                    page,
                    time_spent: self.time_spent,
                });
            }

            if !self.warned && self.time_spent >= self.policy.warning_at() {
                self.warned = true;
                warning_raised = true;
            }
        }

        TickOutcome {
            time_spent: self.time_spent,
            threshold: self.threshold_state(),
            warning_raised,
            checkpoint,
        }
    }

    /// 暂停计时；计时中时总是返回检查点，保证离开页面不丢时间
    pub fn pause(&mut self) -> Option<Checkpoint> {
        match (self.phase, self.page) {
            (TimerPhase::Active, Some(page)) => {
                self.phase = TimerPhase::Paused;
                self.last_committed = self.time_spent;
                Some(Checkpoint {
                    page,
                    time_spent: self.time_spent,
                })
            }
            _ => None,
        }
    }

    pub fn threshold_state(&self) -> ThresholdState {
        self.policy.threshold_state(self.time_spent)
    }

    /// 显式完成请求
    ///
    /// 校验通过后停止计时，返回完成前必须提交的最终检查点。
    /// 存储端接受完成后调用 `confirm_completed()`。
    pub fn request_completion(&mut self) -> Result<Checkpoint, ReadingError> {
        let page = self.page.ok_or(ReadingError::NoActivePage)?;

        match self.threshold_state() {
            ThresholdState::BelowMinimum => Err(ReadingError::ThresholdNotMet {
                page,
                remaining: self.policy.remaining_to_minimum(self.time_spent),
            }),
            ThresholdState::ExceededMaximum => Err(ReadingError::MaximumExceeded {
                page,
                max_time_allowed: self.policy.max_time_allowed,
            }),
            ThresholdState::WithinWindow | ThresholdState::ApproachingMaximum => {
                if self.phase == TimerPhase::Active {
                    self.phase = TimerPhase::Paused;
                }
                self.last_committed = self.time_spent;
                Ok(Checkpoint {
                    page,
                    time_spent: self.time_spent,
                })
            }
        }
    }

    /// 存储端已确认完成，进入终态
    pub fn confirm_completed(&mut self) {
        if self.page.is_some() {
            self.phase = TimerPhase::Completed;
        }
    }

    pub fn page(&self) -> Option<u32> {
        self.page
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn time_spent(&self) -> u64 {
        self.time_spent
    }

    pub fn is_active(&self) -> bool {
        self.phase == TimerPhase::Active
    }
}
