//! SQLite Database - 数据库连接和迁移

use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::Path;

/// 数据库配置
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// 数据库连接串
    pub database_url: String,
    /// 最大连接数
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:./data/pagegate.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl DatabaseConfig {
    pub fn new(path: impl AsRef<Path>, max_connections: u32) -> Self {
        Self {
            database_url: format!("sqlite:{}?mode=rwc", path.as_ref().display()),
            max_connections,
        }
    }

    /// 内存数据库只能使用单连接，否则每个连接各自一份库
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }
}

/// 数据库连接池
pub type DbPool = Pool<Sqlite>;

/// 创建数据库连接池
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    // WAL 模式，允许读写并发
    sqlx::query("PRAGMA journal_mode=WAL")
        .execute(&pool)
        .await?;

    // 遇到锁时等待而不是立即失败
    sqlx::query("PRAGMA busy_timeout=5000")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA synchronous=NORMAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA foreign_keys=ON")
        .execute(&pool)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        "SQLite pool created with WAL mode and busy_timeout=5000ms"
    );

    Ok(pool)
}

/// 运行数据库迁移
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    // 资料元数据
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS materials (
            id TEXT PRIMARY KEY,
            file_type TEXT NOT NULL,
            file_size INTEGER NOT NULL,
            page_count INTEGER,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // 阅读会话：每个 学生 × 资料 一行
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reading_sessions (
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            material_id TEXT NOT NULL,
            course_id TEXT,
            total_pages INTEGER NOT NULL,
            current_page INTEGER NOT NULL DEFAULT 1,
            completed_pages INTEGER NOT NULL DEFAULT 0,
            session_start_time TEXT NOT NULL,
            last_activity TEXT NOT NULL,
            UNIQUE (student_id, material_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reading_pages (
            session_id TEXT NOT NULL,
            page_number INTEGER NOT NULL,
            time_spent INTEGER NOT NULL DEFAULT 0,
            is_completed INTEGER NOT NULL DEFAULT 0,
            min_time_required INTEGER NOT NULL,
            max_time_allowed INTEGER NOT NULL,
            start_time TEXT,
            end_time TEXT,
            PRIMARY KEY (session_id, page_number),
            FOREIGN KEY (session_id) REFERENCES reading_sessions(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_reading_sessions_student
        ON reading_sessions(student_id, last_activity)
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed");
    Ok(())
}
