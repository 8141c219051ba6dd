//! SQLite Persistence - SQLite 数据库持久化实现

mod database;
mod material_repo;
mod reading_session_repo;

pub use database::*;
pub use material_repo::*;
pub use reading_session_repo::*;
