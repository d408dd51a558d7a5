use serde::Serialize;

use crate::models::sheet::SheetResult;

/// 单张图片的失败记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetFailure {
    pub filename: String,
    pub error: String,
}

/// 批次统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub processed: usize,
    pub unknown: usize,
    pub manually_resolved: usize,
    pub failed: usize,
    pub skipped: usize,
    pub copied_to_review: usize,
}

impl BatchStats {
    pub fn merge(&mut self, other: &BatchStats) {
        self.processed += other.processed;
        self.unknown += other.unknown;
        self.manually_resolved += other.manually_resolved;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.copied_to_review += other.copied_to_review;
    }
}

/// 单个批次的汇总输出
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    #[serde(rename = "lote")]
    pub batch: String,
    pub generated_at: String,
    pub results: Vec<SheetResult>,
    pub failures: Vec<SheetFailure>,
}

impl BatchReport {
    pub fn new(batch: impl Into<String>) -> Self {
        Self {
            batch: batch.into(),
            generated_at: chrono::Local::now().to_rfc3339(),
            results: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// 按文件名排序，便于比对
    pub fn sort(&mut self) {
        self.results.sort_by(|a, b| a.filename.cmp(&b.filename));
        self.failures.sort_by(|a, b| a.filename.cmp(&b.filename));
    }

    pub fn unknown_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.identity.is_unknown())
            .count()
    }
}
