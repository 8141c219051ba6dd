//! PageGate - 资料分页阅读计时与下载门控
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Reading Context: 阅读会话、单页计时、顺序解锁、下载门控
//! - Material Context: 资料目录与页数估算
//!
//! 应用层 (application/):
//! - Ports: 端口定义（ReadingSessionRepository, MaterialRepository, ProgressNotifier）
//! - Commands: CQRS 命令处理器
//! - Queries: CQRS 查询处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket
//! - Persistence: SQLite 存储
//! - Memory: 进程内存储
//! - Events: 进度事件广播
//! - Client: 阅读端 HTTP 客户端与计时驱动

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
