//! HTTP Routes
//!
//! API Endpoints（学生身份来自 `X-Student-Id` 请求头）:
//! - /api/ping                                                   GET   健康检查
//! - /api/material-progress                                      GET   当前学生全部资料进度
//! - /api/material-progress/:material_id                         GET   阅读会话
//! - /api/material-progress/:material_id/initialize              POST  创建或获取会话
//! - /api/material-progress/:material_id/progress                GET   阅读进度（轮询）
//! - /api/material-progress/:material_id/can-download            GET   下载权限
//! - /api/material-progress/:material_id/current-page            PUT   切换当前页
//! - /api/material-progress/:material_id/pages/:page/start       POST  开始阅读某页
//! - /api/material-progress/:material_id/pages/:page/time        PUT   检查点提交
//! - /api/material-progress/:material_id/pages/:page/complete    POST  完成某页
//! - /api/material-progress/:material_id/pages/:page/progress    GET   单页进度
//! - /api/materials                                              POST  登记资料元数据
//! - /api/materials/:material_id/page-count                      GET   资料页数
//! - /ws/material-progress/:material_id?student=                 WS    进度推送

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes()).route(
        "/ws/material-progress/:material_id",
        get(handlers::progress_websocket_handler),
    )
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/material-progress", progress_routes())
        .nest("/materials", material_routes())
}

/// 阅读进度路由
fn progress_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::list_reading_progress))
        .route("/:material_id", get(handlers::get_reading_session))
        .route("/:material_id/initialize", post(handlers::initialize_reading))
        .route("/:material_id/progress", get(handlers::get_reading_progress))
        .route("/:material_id/can-download", get(handlers::can_download))
        .route("/:material_id/current-page", put(handlers::set_current_page))
        .route("/:material_id/pages/:page/start", post(handlers::start_page))
        .route("/:material_id/pages/:page/time", put(handlers::commit_page_time))
        .route("/:material_id/pages/:page/complete", post(handlers::complete_page))
        .route("/:material_id/pages/:page/progress", get(handlers::get_page_progress))
}

/// 资料路由
fn material_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(handlers::register_material))
        .route("/:material_id/page-count", get(handlers::get_page_count))
}
