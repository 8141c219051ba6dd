//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, StoreBackend};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "PAGEGATE";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `PAGEGATE_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `PAGEGATE_SERVER__PORT=9090`
/// - `PAGEGATE_DATABASE__PATH=/var/lib/pagegate/progress.db`
/// - `PAGEGATE_STORE__BACKEND=memory`
/// - `PAGEGATE_LOG__JSON=true`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("database.path", "data/pagegate.db")?
        .set_default("database.max_connections", 5)?
        .set_default("store.backend", "sqlite")?
        .set_default("events.channel_capacity", 64)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 例如: PAGEGATE_STORE__BACKEND=memory
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.store.backend == StoreBackend::Sqlite {
        if config.database.path.is_empty() {
            return Err(ConfigError::ValidationError(
                "Database path cannot be empty".to_string(),
            ));
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "Database max_connections must be at least 1".to_string(),
            ));
        }
    }

    if config.events.channel_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "Event channel capacity cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("Store Backend: {}", config.store.backend.as_str());
    if config.store.backend == StoreBackend::Sqlite {
        tracing::info!("Database: {}", config.database.path);
        tracing::info!("Database Max Connections: {}", config.database.max_connections);
    }
    tracing::info!("Event Channel Capacity: {}", config.events.channel_capacity);
    tracing::info!("Log Level: {} (json: {})", config.log.level, config.log.json);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let file = write_config(
            r#"
            [server]
            port = 9090

            [store]
            backend = "memory"

            [events]
            channel_capacity = 8
            "#,
        );

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.events.channel_capacity, 8);
        assert_eq!(config.database.path, "data/pagegate.db");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config_from_path(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn test_unknown_backend_is_parse_error() {
        let file = write_config("[store]\nbackend = \"redis\"\n");
        let result = load_config_from_path(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_db_path_only_matters_for_sqlite() {
        let mut config = AppConfig::default();
        config.database.path = String::new();
        assert!(validate_config(&config).is_err());

        config.store.backend = StoreBackend::Memory;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_capacity() {
        let mut config = AppConfig::default();
        config.events.channel_capacity = 0;
        assert!(validate_config(&config).is_err());
    }
}
