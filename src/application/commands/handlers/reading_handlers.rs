//! Reading Command Handlers

use std::sync::Arc;

use crate::application::commands::reading_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    MaterialRepositoryPort, ProgressNotifierPort, ReadingSessionRepositoryPort,
};
use crate::domain::material::PageCount;
use crate::domain::reading::{MaterialReadingSession, ReadingError};

/// Initialize Handler - 创建或复用阅读会话
pub struct InitializeReadingHandler {
    session_repo: Arc<dyn ReadingSessionRepositoryPort>,
    material_repo: Arc<dyn MaterialRepositoryPort>,
    notifier: Arc<dyn ProgressNotifierPort>,
}

impl InitializeReadingHandler {
    pub fn new(
        session_repo: Arc<dyn ReadingSessionRepositoryPort>,
        material_repo: Arc<dyn MaterialRepositoryPort>,
        notifier: Arc<dyn ProgressNotifierPort>,
    ) -> Self {
        Self {
            session_repo,
            material_repo,
            notifier,
        }
    }

    pub async fn handle(
        &self,
        cmd: InitializeReading,
    ) -> Result<MaterialReadingSession, ApplicationError> {
        // 已存在：原样返回，不截断进度
        if let Some(existing) = self.session_repo.find(&cmd.key).await? {
            if let Some(requested) = cmd.total_pages {
                if requested != existing.total_pages() as i64 {
                    tracing::warn!(
                        key = %cmd.key,
                        stored = existing.total_pages(),
                        requested = requested,
                        "Initialize requested a different page count; keeping stored session"
                    );
                }
            }
            return Ok(existing);
        }

        let total_pages = match cmd.total_pages {
            Some(total) => total,
            None => self.resolve_page_count(&cmd).await? as i64,
        };

        let session = MaterialReadingSession::new(
            cmd.key.material_id.clone(),
            cmd.key.student_id.clone(),
            cmd.course_id.clone(),
            total_pages,
        )?;

        let session = self.session_repo.insert_if_absent(session).await?;

        tracing::info!(
            key = %cmd.key,
            session_id = %session.id(),
            total_pages = session.total_pages(),
            "Reading session initialized"
        );
        self.notifier.progress_changed(&session);

        Ok(session)
    }

    async fn resolve_page_count(&self, cmd: &InitializeReading) -> Result<u32, ApplicationError> {
        let material = self
            .material_repo
            .find_by_id(&cmd.key.material_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Material", &cmd.key.material_id))?;

        let count =
            PageCount::resolve(material.page_count, material.file_size, &material.file_type);
        tracing::debug!(
            material_id = %material.id,
            pages = count.pages(),
            estimated = count.is_estimated(),
            "Resolved page count from material catalog"
        );
        Ok(count.pages())
    }
}

/// StartPage Handler - 开始阅读某页
pub struct StartPageReadingHandler {
    session_repo: Arc<dyn ReadingSessionRepositoryPort>,
    notifier: Arc<dyn ProgressNotifierPort>,
}

impl StartPageReadingHandler {
    pub fn new(
        session_repo: Arc<dyn ReadingSessionRepositoryPort>,
        notifier: Arc<dyn ProgressNotifierPort>,
    ) -> Self {
        Self {
            session_repo,
            notifier,
        }
    }

    pub async fn handle(
        &self,
        cmd: StartPageReading,
    ) -> Result<MaterialReadingSession, ApplicationError> {
        let page = cmd.page;
        let session = self
            .session_repo
            .update(
                &cmd.key,
                Box::new(move |s: &mut MaterialReadingSession| s.start_page(page)),
            )
            .await?;

        tracing::debug!(key = %cmd.key, page = page, "Page reading started");
        self.notifier.progress_changed(&session);

        Ok(session)
    }
}

/// CommitPageTime Handler - 检查点提交
pub struct CommitPageTimeHandler {
    session_repo: Arc<dyn ReadingSessionRepositoryPort>,
}

impl CommitPageTimeHandler {
    pub fn new(session_repo: Arc<dyn ReadingSessionRepositoryPort>) -> Self {
        Self { session_repo }
    }

    pub async fn handle(
        &self,
        cmd: CommitPageTime,
    ) -> Result<MaterialReadingSession, ApplicationError> {
        let (page, time_spent) = (cmd.page, cmd.time_spent);
        let session = self
            .session_repo
            .update(
                &cmd.key,
                Box::new(move |s: &mut MaterialReadingSession| {
                    s.commit_page_time(page, time_spent).map(|_| ())
                }),
            )
            .await?;

        let stored = session.page(page)?.time_spent();
        if stored > time_spent {
            tracing::debug!(
                key = %cmd.key,
                page = page,
                incoming = time_spent,
                stored = stored,
                "Stale checkpoint ignored"
            );
        } else {
            tracing::debug!(
                key = %cmd.key,
                page = page,
                time_spent = stored,
                "Checkpoint committed"
            );
        }

        Ok(session)
    }
}

/// CompletePage Handler - 完成某页
pub struct CompletePageHandler {
    session_repo: Arc<dyn ReadingSessionRepositoryPort>,
    notifier: Arc<dyn ProgressNotifierPort>,
}

impl CompletePageHandler {
    pub fn new(
        session_repo: Arc<dyn ReadingSessionRepositoryPort>,
        notifier: Arc<dyn ProgressNotifierPort>,
    ) -> Self {
        Self {
            session_repo,
            notifier,
        }
    }

    pub async fn handle(
        &self,
        cmd: CompletePage,
    ) -> Result<MaterialReadingSession, ApplicationError> {
        let page = cmd.page;
        let result = self
            .session_repo
            .update(
                &cmd.key,
                Box::new(move |s: &mut MaterialReadingSession| s.complete_page(page).map(|_| ())),
            )
            .await;

        let session = match result {
            Ok(session) => session,
            Err(e) => {
                let err = ApplicationError::from(e);
                if let ApplicationError::Reading(reading) = &err {
                    log_rejection(&cmd, reading);
                }
                return Err(err);
            }
        };

        tracing::info!(
            key = %cmd.key,
            page = page,
            completed_pages = session.completed_pages(),
            total_pages = session.total_pages(),
            "Page completed"
        );
        self.notifier.page_completed(&session, page);
        self.notifier.progress_changed(&session);

        Ok(session)
    }
}

fn log_rejection(cmd: &CompletePage, err: &ReadingError) {
    if err.is_user_facing() {
        tracing::info!(key = %cmd.key, page = cmd.page, reason = %err, "Page completion rejected");
    } else {
        tracing::warn!(key = %cmd.key, page = cmd.page, reason = %err, "Page completion rejected");
    }
}

/// SetCurrentPage Handler - 切换当前页
pub struct SetCurrentPageHandler {
    session_repo: Arc<dyn ReadingSessionRepositoryPort>,
    notifier: Arc<dyn ProgressNotifierPort>,
}

impl SetCurrentPageHandler {
    pub fn new(
        session_repo: Arc<dyn ReadingSessionRepositoryPort>,
        notifier: Arc<dyn ProgressNotifierPort>,
    ) -> Self {
        Self {
            session_repo,
            notifier,
        }
    }

    pub async fn handle(
        &self,
        cmd: SetCurrentPage,
    ) -> Result<MaterialReadingSession, ApplicationError> {
        let page = cmd.page;
        let session = self
            .session_repo
            .update(
                &cmd.key,
                Box::new(move |s: &mut MaterialReadingSession| s.set_current_page(page)),
            )
            .await?;

        tracing::debug!(key = %cmd.key, page = page, "Current page changed");
        self.notifier.progress_changed(&session);

        Ok(session)
    }
}
