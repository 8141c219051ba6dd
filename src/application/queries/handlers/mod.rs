//! Query Handlers 实现

mod material_handlers;
mod reading_handlers;

pub use material_handlers::*;
pub use reading_handlers::*;
