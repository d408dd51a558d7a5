//! 图片处理上下文
//!
//! 封装"我正在处理哪个批次的第几张图片"这一信息

use std::fmt::Display;
use std::path::{Path, PathBuf};

/// 图片处理上下文
#[derive(Debug, Clone)]
pub struct SheetCtx {
    /// 批次名称
    pub batch: String,

    /// 图片在批次中的序号（从1开始，仅用于日志显示）
    pub index: usize,

    /// 批次图片总数
    pub total: usize,

    /// 源文件路径
    pub path: PathBuf,

    /// 批次内唯一的记录名，默认为源文件名；结果与人工对照都以它为键
    pub filename: String,
}

impl SheetCtx {
    pub fn new(batch: impl Into<String>, index: usize, total: usize, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            batch: batch.into(),
            index,
            total,
            path,
            filename,
        }
    }

    /// 使用扫描阶段分配的记录名
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Display for SheetCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[批次 {} 图片 {}/{} {}]",
            self.batch, self.index, self.total, self.filename
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctx_filename_and_display() {
        let ctx = SheetCtx::new("Lote 1", 3, 10, "/data/Lote 1/turma/003.jpg");
        assert_eq!(ctx.filename, "003.jpg");
        assert_eq!(ctx.to_string(), "[批次 Lote 1 图片 3/10 003.jpg]");
    }

    #[test]
    fn test_ctx_with_record_name() {
        let ctx = SheetCtx::new("Lote 1", 1, 2, "/data/Lote 1/turma2/003.jpg").with_filename("turma2_003.jpg");
        assert_eq!(ctx.filename, "turma2_003.jpg");
        assert_eq!(ctx.path(), Path::new("/data/Lote 1/turma2/003.jpg"));
    }
}
