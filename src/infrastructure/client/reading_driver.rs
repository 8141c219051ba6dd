//! Reading Driver - 阅读端计时调度
//!
//! `PageTimer` 由一个独立任务持有：
//! - 每秒一次 tick（`tokio::time::interval`）
//! - UI 操作通过 mpsc 发送 `ReaderCommand`
//! - 状态通过 watch 通道发布 `ReaderSnapshot`
//!
//! 检查点提交是 fire-and-forget：失败只记录日志，由下一次检查点覆盖；
//! 初始化与完成请求则等待结果并返回给调用方。

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::progress_client::{ClientError, ProgressApi};
use crate::domain::reading::{
    Checkpoint, MaterialId, PageTimer, ReadingError, ThresholdState, TickOutcome, TimerPhase,
};
use crate::infrastructure::http::dto::SessionDto;

/// 命令通道容量
const COMMAND_BUFFER: usize = 32;

/// 驱动错误
#[derive(Debug, Clone, Error)]
pub enum DriverError {
    /// 本地计时器判定不满足完成条件
    #[error(transparent)]
    Reading(#[from] ReadingError),

    #[error(transparent)]
    Client(#[from] ClientError),

    /// 驱动任务已退出
    #[error("Reading driver stopped")]
    Stopped,
}

type Reply = oneshot::Sender<Result<SessionDto, DriverError>>;

/// UI 发给驱动的命令
#[derive(Debug)]
pub enum ReaderCommand {
    /// 开始阅读某页（服务端校验顺序后开始计时）
    Start { page: u32, reply: Reply },
    /// 暂停计时（切到后台、离开页面）
    Pause,
    /// 完成当前页
    Complete { reply: Reply },
    /// 只切换当前页，不计时（回看已完成页面）
    Navigate { page: u32, reply: Reply },
    /// 提交最终检查点并退出
    Shutdown,
}

/// 发布给 UI 的状态快照
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderSnapshot {
    pub material_id: MaterialId,
    pub page: Option<u32>,
    pub phase: TimerPhase,
    pub time_spent: u64,
    pub threshold: ThresholdState,
    /// 已发出接近上限提醒
    pub warned: bool,
    pub current_page: u32,
    pub completed_pages: u32,
    pub total_pages: u32,
    pub can_download: bool,
    /// 最近一次需要展示给用户的错误
    pub last_error: Option<String>,
}

/// 阅读驱动
pub struct ReadingDriver {
    api: Arc<dyn ProgressApi>,
    material_id: MaterialId,
    timer: PageTimer,
    session: SessionDto,
    warned: bool,
    last_error: Option<String>,
    snapshot_tx: watch::Sender<ReaderSnapshot>,
}

impl ReadingDriver {
    /// 初始化会话（等待服务端返回）
    pub async fn initialize(
        api: Arc<dyn ProgressApi>,
        material_id: MaterialId,
        total_pages: Option<i64>,
        course_id: Option<String>,
    ) -> Result<Self, DriverError> {
        let session = api
            .initialize(&material_id, total_pages, course_id)
            .await?;

        tracing::info!(
            material_id = %material_id,
            total_pages = session.total_pages,
            completed_pages = session.completed_pages,
            "Reading driver initialized"
        );

        let timer = PageTimer::default();
        let snapshot = Self::build_snapshot(&material_id, &timer, &session, false, None);
        let (snapshot_tx, _) = watch::channel(snapshot);

        Ok(Self {
            api,
            material_id,
            timer,
            session,
            warned: false,
            last_error: None,
            snapshot_tx,
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<ReaderSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn session(&self) -> &SessionDto {
        &self.session
    }

    pub fn timer(&self) -> &PageTimer {
        &self.timer
    }

    /// 启动驱动任务
    pub fn spawn(self) -> ReaderHandle {
        let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
        let snapshot = self.subscribe();
        let task = tokio::spawn(self.run(rx));
        ReaderHandle {
            commands,
            snapshot,
            task,
        }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<ReaderCommand>) {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // 第一次 tick 立即完成
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.on_tick();
                }
                command = commands.recv() => match command {
                    Some(ReaderCommand::Start { page, reply }) => {
                        let _ = reply.send(self.start_page(page).await);
                    }
                    Some(ReaderCommand::Pause) => self.pause(),
                    Some(ReaderCommand::Complete { reply }) => {
                        let _ = reply.send(self.complete().await);
                    }
                    Some(ReaderCommand::Navigate { page, reply }) => {
                        let _ = reply.send(self.navigate(page).await);
                    }
                    Some(ReaderCommand::Shutdown) | None => {
                        self.shutdown().await;
                        break;
                    }
                },
            }
        }

        tracing::debug!(material_id = %self.material_id, "Reading driver stopped");
    }

    // ========== Steps ==========

    /// 推进 1 秒
    pub fn on_tick(&mut self) -> TickOutcome {
        let outcome = self.timer.tick();

        if let Some(checkpoint) = outcome.checkpoint {
            self.commit_in_background(checkpoint);
        }
        if outcome.warning_raised {
            self.warned = true;
            tracing::info!(
                material_id = %self.material_id,
                page = ?self.timer.page(),
                time_spent = outcome.time_spent,
                "Approaching maximum reading time"
            );
        }
        if self.timer.is_active() {
            self.publish();
        }
        outcome
    }

    /// 开始阅读某页
    ///
    /// 服务端拒绝（页面未解锁）时计时器保持原状
    pub async fn start_page(&mut self, page: u32) -> Result<SessionDto, DriverError> {
        let session = match self.api.start_page(&self.material_id, page).await {
            Ok(session) => session,
            Err(e) => return Err(self.fail(e.into())),
        };

        let carried = session
            .pages
            .iter()
            .find(|p| p.state.page_number() == page)
            .map(|p| (p.state.time_spent(), p.state.is_completed()));

        match carried {
            Some((_, true)) => {
                // 已完成的页面只切换查看，不再计时
                if let Some(checkpoint) = self.timer.pause() {
                    self.commit_in_background(checkpoint);
                }
            }
            Some((time_spent, false)) => {
                if self.timer.page() != Some(page) {
                    self.warned = false;
                }
                if let Some(previous) = self.timer.start(page, time_spent) {
                    self.commit_in_background(previous);
                }
            }
            None => {}
        }

        self.session = session.clone();
        self.last_error = None;
        self.publish();
        Ok(session)
    }

    /// 暂停计时并提交检查点
    pub fn pause(&mut self) {
        if let Some(checkpoint) = self.timer.pause() {
            self.commit_in_background(checkpoint);
        }
        self.publish();
    }

    /// 完成当前页
    ///
    /// 先提交最终检查点再请求完成，两者都等待结果
    pub async fn complete(&mut self) -> Result<SessionDto, DriverError> {
        let was_active = self.timer.is_active();
        let checkpoint = match self.timer.request_completion() {
            Ok(checkpoint) => checkpoint,
            Err(e) => return Err(self.fail(e.into())),
        };

        let result = match self
            .api
            .commit_page_time(&self.material_id, checkpoint.page, checkpoint.time_spent)
            .await
        {
            Ok(_) => {
                self.api
                    .complete_page(&self.material_id, checkpoint.page)
                    .await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(session) => {
                self.timer.confirm_completed();
                tracing::info!(
                    material_id = %self.material_id,
                    page = checkpoint.page,
                    completed_pages = session.completed_pages,
                    total_pages = session.total_pages,
                    "Page completed"
                );
                self.session = session.clone();
                self.last_error = None;
                self.publish();
                Ok(session)
            }
            Err(e) => {
                // 未完成且之前在计时则恢复计时；已暂停的保持暂停
                if was_active {
                    self.timer.start(checkpoint.page, checkpoint.time_spent);
                }
                Err(self.fail(e.into()))
            }
        }
    }

    /// 只切换当前页，暂停计时
    pub async fn navigate(&mut self, page: u32) -> Result<SessionDto, DriverError> {
        match self.api.set_current_page(&self.material_id, page).await {
            Ok(session) => {
                if self.timer.page() != Some(page) {
                    if let Some(checkpoint) = self.timer.pause() {
                        self.commit_in_background(checkpoint);
                    }
                }
                self.session = session.clone();
                self.last_error = None;
                self.publish();
                Ok(session)
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// 退出前提交最终检查点（等待结果，失败只记录）
    pub async fn shutdown(&mut self) {
        if let Some(checkpoint) = self.timer.pause() {
            if let Err(e) = self
                .api
                .commit_page_time(&self.material_id, checkpoint.page, checkpoint.time_spent)
                .await
            {
                tracing::warn!(
                    material_id = %self.material_id,
                    page = checkpoint.page,
                    error = %e,
                    "Final checkpoint failed"
                );
            }
        }
        self.publish();
    }

    // ========== Internals ==========

    fn commit_in_background(&self, checkpoint: Checkpoint) {
        let api = self.api.clone();
        let material_id = self.material_id.clone();
        tokio::spawn(async move {
            if let Err(e) = api
                .commit_page_time(&material_id, checkpoint.page, checkpoint.time_spent)
                .await
            {
                tracing::warn!(
                    material_id = %material_id,
                    page = checkpoint.page,
                    time_spent = checkpoint.time_spent,
                    error = %e,
                    "Checkpoint commit failed; next checkpoint will supersede it"
                );
            }
        });
    }

    fn fail(&mut self, error: DriverError) -> DriverError {
        self.last_error = Some(error.to_string());
        self.publish();
        error
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(Self::build_snapshot(
            &self.material_id,
            &self.timer,
            &self.session,
            self.warned,
            self.last_error.clone(),
        ));
    }

    fn build_snapshot(
        material_id: &MaterialId,
        timer: &PageTimer,
        session: &SessionDto,
        warned: bool,
        last_error: Option<String>,
    ) -> ReaderSnapshot {
        ReaderSnapshot {
            material_id: material_id.clone(),
            page: timer.page(),
            phase: timer.phase(),
            time_spent: timer.time_spent(),
            threshold: timer.threshold_state(),
            warned,
            current_page: session.current_page,
            completed_pages: session.completed_pages,
            total_pages: session.total_pages,
            can_download: session.progress.can_download,
            last_error,
        }
    }
}

/// 驱动任务句柄
pub struct ReaderHandle {
    commands: mpsc::Sender<ReaderCommand>,
    snapshot: watch::Receiver<ReaderSnapshot>,
    task: JoinHandle<()>,
}

impl ReaderHandle {
    pub fn snapshot(&self) -> ReaderSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<ReaderSnapshot> {
        self.snapshot.clone()
    }

    pub async fn start(&self, page: u32) -> Result<SessionDto, DriverError> {
        self.request(|reply| ReaderCommand::Start { page, reply })
            .await
    }

    pub async fn pause(&self) -> Result<(), DriverError> {
        self.commands
            .send(ReaderCommand::Pause)
            .await
            .map_err(|_| DriverError::Stopped)
    }

    pub async fn complete(&self) -> Result<SessionDto, DriverError> {
        self.request(|reply| ReaderCommand::Complete { reply }).await
    }

    pub async fn navigate(&self, page: u32) -> Result<SessionDto, DriverError> {
        self.request(|reply| ReaderCommand::Navigate { page, reply })
            .await
    }

    /// 提交最终检查点并等待任务退出
    pub async fn shutdown(self) {
        let _ = self.commands.send(ReaderCommand::Shutdown).await;
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Reading driver task ended abnormally");
        }
    }

    async fn request(
        &self,
        command: impl FnOnce(Reply) -> ReaderCommand,
    ) -> Result<SessionDto, DriverError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| DriverError::Stopped)?;
        rx.await.map_err(|_| DriverError::Stopped)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use crate::domain::reading::{
        download, MaterialReadingSession, ReadingProgress, StudentId, MAX_TIME_ALLOWED_SECS,
        MIN_TIME_REQUIRED_SECS,
    };
    use crate::infrastructure::http::dto::DownloadDto;
    use crate::infrastructure::http::ApiError;

    /// 进程内假服务：直接作用于领域聚合
    struct FakeApi {
        session: Mutex<Option<MaterialReadingSession>>,
        commits: Mutex<Vec<(u32, u64)>>,
        offline: AtomicBool,
    }

    impl FakeApi {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                session: Mutex::new(None),
                commits: Mutex::new(Vec::new()),
                offline: AtomicBool::new(false),
            })
        }

        fn commits(&self) -> Vec<(u32, u64)> {
            self.commits.lock().unwrap().clone()
        }

        fn stored_time(&self, page: u32) -> u64 {
            let guard = self.session.lock().unwrap();
            guard.as_ref().unwrap().page(page).unwrap().time_spent()
        }

        fn apply(
            &self,
            f: impl FnOnce(&mut MaterialReadingSession) -> Result<(), ReadingError>,
        ) -> Result<SessionDto, ClientError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(ClientError::Network("connection refused".to_string()));
            }
            let mut guard = self.session.lock().unwrap();
            let session = guard.as_mut().unwrap();
            let mut draft = session.clone();
            f(&mut draft).map_err(|e| ClientError::Api {
                errno: ApiError::Reading(e.clone()).status_and_errno().1,
                message: e.to_string(),
            })?;
            *session = draft;
            Ok(SessionDto::from(&*session))
        }
    }

    #[async_trait]
    impl ProgressApi for FakeApi {
        async fn initialize(
            &self,
            material_id: &MaterialId,
            total_pages: Option<i64>,
            _course_id: Option<String>,
        ) -> Result<SessionDto, ClientError> {
            let mut guard = self.session.lock().unwrap();
            if guard.is_none() {
                let session = MaterialReadingSession::new(
                    material_id.clone(),
                    StudentId::new("stu").unwrap(),
                    None,
                    total_pages.unwrap_or(1),
                )
                .map_err(|e| ClientError::Api {
                    errno: 4001,
                    message: e.to_string(),
                })?;
                *guard = Some(session);
            }
            Ok(SessionDto::from(guard.as_ref().unwrap()))
        }

        async fn start_page(&self, _: &MaterialId, page: u32) -> Result<SessionDto, ClientError> {
            self.apply(|s| s.start_page(page))
        }

        async fn commit_page_time(
            &self,
            _: &MaterialId,
            page: u32,
            time_spent: u64,
        ) -> Result<SessionDto, ClientError> {
            let result = self.apply(|s| s.commit_page_time(page, time_spent).map(|_| ()));
            if result.is_ok() {
                self.commits.lock().unwrap().push((page, time_spent));
            }
            result
        }

        async fn complete_page(
            &self,
            _: &MaterialId,
            page: u32,
        ) -> Result<SessionDto, ClientError> {
            self.apply(|s| s.complete_page(page).map(|_| ()))
        }

        async fn set_current_page(
            &self,
            _: &MaterialId,
            page: u32,
        ) -> Result<SessionDto, ClientError> {
            self.apply(|s| s.set_current_page(page))
        }

        async fn progress(&self, _: &MaterialId) -> Result<SessionDto, ClientError> {
            let guard = self.session.lock().unwrap();
            Ok(SessionDto::from(guard.as_ref().unwrap()))
        }

        async fn can_download(&self, _: &MaterialId) -> Result<DownloadDto, ClientError> {
            let guard = self.session.lock().unwrap();
            let session = guard.as_ref().unwrap();
            Ok(DownloadDto {
                decision: download::can_download(session),
                progress: ReadingProgress::from(session),
            })
        }
    }

    async fn driver(api: Arc<FakeApi>, pages: i64) -> ReadingDriver {
        ReadingDriver::initialize(api, MaterialId::new("doc").unwrap(), Some(pages), None)
            .await
            .unwrap()
    }

    fn tick_n(driver: &mut ReadingDriver, n: u64) {
        for _ in 0..n {
            driver.on_tick();
        }
    }

    /// 让后台提交任务跑完
    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_checkpoints_every_thirty_seconds() {
        let api = FakeApi::new();
        let mut driver = driver(api.clone(), 2).await;
        driver.start_page(1).await.unwrap();

        tick_n(&mut driver, 95);
        settle().await;

        assert_eq!(api.commits(), vec![(1, 30), (1, 60), (1, 90)]);
        assert_eq!(api.stored_time(1), 90);
        assert_eq!(driver.timer().time_spent(), 95);
    }

    #[tokio::test]
    async fn test_early_completion_is_rejected_locally() {
        let api = FakeApi::new();
        let mut driver = driver(api.clone(), 2).await;
        driver.start_page(1).await.unwrap();
        tick_n(&mut driver, 300);

        let err = driver.complete().await.unwrap_err();
        assert!(matches!(
            err,
            DriverError::Reading(ReadingError::ThresholdNotMet { page: 1, remaining: 60 })
        ));
        assert!(driver.timer().is_active());
        assert!(driver.subscribe().borrow().last_error.is_some());
    }

    #[tokio::test]
    async fn test_two_page_flow_unlocks_download() {
        let api = FakeApi::new();
        let mut driver = driver(api.clone(), 2).await;
        let snapshots = driver.subscribe();

        // 第 2 页在第 1 页完成前不可进入
        assert!(matches!(
            driver.start_page(2).await,
            Err(DriverError::Client(ClientError::Api { .. }))
        ));

        driver.start_page(1).await.unwrap();
        tick_n(&mut driver, MIN_TIME_REQUIRED_SECS);
        let session = driver.complete().await.unwrap();
        assert_eq!(session.completed_pages, 1);
        assert_eq!(session.current_page, 2);
        assert_eq!(driver.timer().phase(), TimerPhase::Completed);

        driver.start_page(2).await.unwrap();
        tick_n(&mut driver, MIN_TIME_REQUIRED_SECS + 10);
        driver.complete().await.unwrap();
        settle().await;

        let snapshot = snapshots.borrow().clone();
        assert_eq!(snapshot.completed_pages, 2);
        assert!(snapshot.can_download);
        assert_eq!(api.stored_time(2), MIN_TIME_REQUIRED_SECS + 10);
    }

    #[tokio::test]
    async fn test_warning_then_maximum_blocks_completion() {
        let api = FakeApi::new();
        let mut driver = driver(api.clone(), 1).await;
        driver.start_page(1).await.unwrap();

        tick_n(&mut driver, MAX_TIME_ALLOWED_SECS - 60);
        assert!(driver.subscribe().borrow().warned);
        assert_eq!(
            driver.subscribe().borrow().threshold,
            ThresholdState::ApproachingMaximum
        );

        tick_n(&mut driver, 140);
        let err = driver.complete().await.unwrap_err();
        assert!(matches!(
            err,
            DriverError::Reading(ReadingError::MaximumExceeded { page: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_checkpoints_are_swallowed() {
        let api = FakeApi::new();
        let mut driver = driver(api.clone(), 1).await;
        driver.start_page(1).await.unwrap();

        api.offline.store(true, Ordering::SeqCst);
        tick_n(&mut driver, 60);
        settle().await;
        assert!(api.commits().is_empty());

        api.offline.store(false, Ordering::SeqCst);
        tick_n(&mut driver, 30);
        settle().await;
        assert_eq!(api.commits(), vec![(1, 90)]);
        assert!(driver.timer().is_active());
    }

    #[tokio::test]
    async fn test_resume_carries_stored_time() {
        let api = FakeApi::new();
        {
            let mut first = driver(api.clone(), 1).await;
            first.start_page(1).await.unwrap();
            tick_n(&mut first, 100);
            first.shutdown().await;
        }
        assert_eq!(api.stored_time(1), 100);

        let mut second = driver(api.clone(), 1).await;
        second.start_page(1).await.unwrap();
        assert_eq!(second.timer().time_spent(), 100);
    }

    #[tokio::test]
    async fn test_spawned_driver_handles_commands() {
        let api = FakeApi::new();
        let handle = driver(api.clone(), 2).await.spawn();

        let session = handle.start(1).await.unwrap();
        assert_eq!(session.current_page, 1);
        assert_eq!(handle.snapshot().phase, TimerPhase::Active);

        assert!(matches!(
            handle.complete().await,
            Err(DriverError::Reading(ReadingError::ThresholdNotMet { .. }))
        ));

        handle.pause().await.unwrap();
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_failed_completion_keeps_paused_timer() {
        let api = FakeApi::new();
        let mut driver = driver(api.clone(), 2).await;
        driver.start_page(1).await.unwrap();
        tick_n(&mut driver, 400);
        driver.pause();
        settle().await;
        assert_eq!(api.stored_time(1), 400);

        api.offline.store(true, Ordering::SeqCst);
        assert!(matches!(
            driver.complete().await,
            Err(DriverError::Client(ClientError::Network(_)))
        ));
        assert_eq!(driver.timer().phase(), TimerPhase::Paused);

        tick_n(&mut driver, 10);
        assert_eq!(driver.timer().time_spent(), 400);
        assert_eq!(driver.subscribe().borrow().phase, TimerPhase::Paused);
    }

    #[tokio::test]
    async fn test_failed_completion_resumes_active_timer() {
        let api = FakeApi::new();
        let mut driver = driver(api.clone(), 2).await;
        driver.start_page(1).await.unwrap();
        tick_n(&mut driver, 400);

        api.offline.store(true, Ordering::SeqCst);
        assert!(driver.complete().await.is_err());
        assert!(driver.timer().is_active());

        tick_n(&mut driver, 10);
        assert_eq!(driver.timer().time_spent(), 410);
    }

    #[tokio::test]
    async fn test_complete_without_page_is_rejected() {
        let api = FakeApi::new();
        let mut driver = driver(api.clone(), 1).await;
        assert!(matches!(
            driver.complete().await,
            Err(DriverError::Reading(ReadingError::NoActivePage))
        ));
        assert!(api.commits().is_empty());
    }
}
