//! Material Queries

use crate::domain::reading::MaterialId;

/// 获取资料页数
#[derive(Debug, Clone)]
pub struct GetPageCount {
    pub material_id: MaterialId,
}
