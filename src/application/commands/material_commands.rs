//! Material Commands - 资料元数据命令

use crate::domain::reading::MaterialId;

/// 登记资料元数据
#[derive(Debug, Clone)]
pub struct RegisterMaterial {
    pub id: MaterialId,
    pub file_type: String,
    pub file_size: u64,
    pub page_count: Option<u32>,
}
