//! PageGate - 资料分页阅读计时服务
//!
//! - Domain: reading/, material/
//! - Application: commands, queries, ports
//! - Infrastructure: http, memory, persistence, events

use std::sync::Arc;

use pagegate::application::{MaterialRepositoryPort, ReadingSessionRepositoryPort};
use pagegate::config::{load_config, print_config, AppConfig, StoreBackend};
use pagegate::infrastructure::events::EventPublisher;
use pagegate::infrastructure::http::{AppState, HttpServer, ServerConfig};
use pagegate::infrastructure::memory::{
    InMemoryMaterialRepository, InMemoryReadingSessionRepository,
};
use pagegate::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteMaterialRepository,
    SqliteReadingSessionRepository,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("PageGate - timed page-gating service");
    print_config(&config);

    let (session_repo, material_repo) = build_repositories(&config).await?;
    let event_publisher = Arc::new(EventPublisher::with_capacity(
        config.events.channel_capacity,
    ));

    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let state = AppState::new(session_repo, material_repo, event_publisher);
    let server = HttpServer::new(server_config, state);

    tracing::info!("Starting HTTP server...");

    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                return;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},pagegate={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn build_repositories(
    config: &AppConfig,
) -> anyhow::Result<(
    Arc<dyn ReadingSessionRepositoryPort>,
    Arc<dyn MaterialRepositoryPort>,
)> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory progress store; progress is lost on restart");
            Ok((
                Arc::new(InMemoryReadingSessionRepository::new()),
                Arc::new(InMemoryMaterialRepository::new()),
            ))
        }
        StoreBackend::Sqlite => {
            if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            let db_config = DatabaseConfig {
                database_url: config.database.database_url(),
                max_connections: config.database.max_connections,
            };
            let pool = create_pool(&db_config).await?;
            run_migrations(&pool).await?;

            Ok((
                Arc::new(SqliteReadingSessionRepository::new(pool.clone())),
                Arc::new(SqliteMaterialRepository::new(pool)),
            ))
        }
    }
}
