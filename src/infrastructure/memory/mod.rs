//! Memory Layer - In-Memory Repositories
//!
//! 阅读会话与资料元数据的内存实现，用于测试和 `store.backend = "memory"` 的单机部署

mod material_store;
mod reading_session_store;

pub use material_store::InMemoryMaterialRepository;
pub use reading_session_store::InMemoryReadingSessionRepository;
