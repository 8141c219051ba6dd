//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    CommitPageTimeHandler, CompletePageHandler, InitializeReadingHandler, RegisterMaterialHandler,
    SetCurrentPageHandler, StartPageReadingHandler,
    // Query handlers
    CheckDownloadHandler, GetPageCountHandler, GetPageProgressHandler,
    GetReadingSessionHandler, ListStudentProgressHandler,
    // Ports
    MaterialRepositoryPort, ProgressNotifierPort, ReadingSessionRepositoryPort,
};
use crate::infrastructure::events::EventPublisher;

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub session_repo: Arc<dyn ReadingSessionRepositoryPort>,
    pub material_repo: Arc<dyn MaterialRepositoryPort>,
    pub event_publisher: Arc<EventPublisher>,

    // ========== Command Handlers ==========
    pub initialize_handler: InitializeReadingHandler,
    pub start_page_handler: StartPageReadingHandler,
    pub commit_time_handler: CommitPageTimeHandler,
    pub complete_page_handler: CompletePageHandler,
    pub set_current_page_handler: SetCurrentPageHandler,
    pub register_material_handler: RegisterMaterialHandler,

    // ========== Query Handlers ==========
    pub get_session_handler: GetReadingSessionHandler,
    pub get_page_progress_handler: GetPageProgressHandler,
    pub check_download_handler: CheckDownloadHandler,
    pub list_progress_handler: ListStudentProgressHandler,
    pub get_page_count_handler: GetPageCountHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        session_repo: Arc<dyn ReadingSessionRepositoryPort>,
        material_repo: Arc<dyn MaterialRepositoryPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        let notifier: Arc<dyn ProgressNotifierPort> = event_publisher.clone();

        Self {
            // Ports
            session_repo: session_repo.clone(),
            material_repo: material_repo.clone(),
            event_publisher,

            // Command handlers
            initialize_handler: InitializeReadingHandler::new(
                session_repo.clone(),
                material_repo.clone(),
                notifier.clone(),
            ),
            start_page_handler: StartPageReadingHandler::new(
                session_repo.clone(),
                notifier.clone(),
            ),
            commit_time_handler: CommitPageTimeHandler::new(session_repo.clone()),
            complete_page_handler: CompletePageHandler::new(session_repo.clone(), notifier.clone()),
            set_current_page_handler: SetCurrentPageHandler::new(session_repo.clone(), notifier),
            register_material_handler: RegisterMaterialHandler::new(material_repo.clone()),

            // Query handlers
            get_session_handler: GetReadingSessionHandler::new(session_repo.clone()),
            get_page_progress_handler: GetPageProgressHandler::new(session_repo.clone()),
            check_download_handler: CheckDownloadHandler::new(session_repo.clone()),
            list_progress_handler: ListStudentProgressHandler::new(session_repo),
            get_page_count_handler: GetPageCountHandler::new(material_repo),
        }
    }
}
