//! 资料页数估算
//!
//! 后端没有登记真实页数时，根据文件大小与类型粗略估算

/// PDF 平均单页大小
const AVERAGE_PDF_PAGE_BYTES: u64 = 75 * 1024;

/// 估算页数上限
const MAX_ESTIMATED_PAGES: u32 = 50;

/// 页数来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCount {
    /// 后端登记的真实页数
    Known(u32),
    /// 根据文件大小估算
    Estimated(u32),
}

impl PageCount {
    pub fn resolve(known: Option<u32>, file_size: u64, file_type: &str) -> Self {
        match known {
            Some(pages) if pages > 0 => PageCount::Known(pages),
            _ => PageCount::Estimated(estimate_pages(file_size, file_type)),
        }
    }

    pub fn pages(&self) -> u32 {
        match self {
            PageCount::Known(pages) | PageCount::Estimated(pages) => *pages,
        }
    }

    pub fn is_estimated(&self) -> bool {
        matches!(self, PageCount::Estimated(_))
    }
}

/// 非 PDF 文件按单页处理；PDF 按 75KB/页估算，限制在 1..=50
pub fn estimate_pages(file_size: u64, file_type: &str) -> u32 {
    if !file_type.to_ascii_lowercase().contains("pdf") {
        return 1;
    }

    let estimated = file_size.div_ceil(AVERAGE_PDF_PAGE_BYTES);
    estimated.clamp(1, MAX_ESTIMATED_PAGES as u64) as u32
}
