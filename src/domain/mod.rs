//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Reading Context: 分页阅读计时与解锁
//! - Material Context: 资料页数

pub mod material;
pub mod reading;
