//! Material Context - 学习资料元数据
//!
//! 资料本身由外部后端管理，这里只关心页数

mod page_count;

pub use page_count::{estimate_pages, PageCount};
