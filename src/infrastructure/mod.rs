//! 基础设施层（Infrastructure Layer）
//!
//! 磁盘、外部查询、结果落盘。只暴露能力，不认识流程。

pub mod image_source;
pub mod layout_lookup;
pub mod report_store;

pub use image_source::load_grayscale;
pub use layout_lookup::{CachedLayoutLookup, LayoutLookup, SuffixLayoutLookup, TableLayoutLookup};
pub use report_store::{sanitize_batch_name, ReportStore};
