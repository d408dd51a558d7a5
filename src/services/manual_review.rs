//! 人工核查目录 - 业务能力层
//!
//! 只负责"把身份未知的图片复制到人工核查目录"这一能力，不关心流程

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tokio::fs;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// 人工核查目录
///
/// 职责：
/// - 同一个源文件只复制一次
/// - 并发调用安全
/// - 不修改、不删除源文件
pub struct ManualReviewSink {
    dir: PathBuf,
    copied: Mutex<HashSet<PathBuf>>,
}

impl ManualReviewSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            copied: Mutex::new(HashSet::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 复制图片到核查目录，副本以 `name` 命名
    ///
    /// # 返回
    /// 本次调用实际复制时返回 `true`，之前已复制过返回 `false`
    pub async fn submit(&self, source: &Path, name: &str) -> AppResult<bool> {
        if !self.claim(source) {
            debug!("已在核查目录中，跳过: {}", source.display());
            return Ok(false);
        }

        if name.is_empty() || Path::new(name).file_name() != Some(std::ffi::OsStr::new(name)) {
            self.release(source);
            return Err(AppError::Other(format!("无效的副本文件名: {}", name)));
        }
        let target = self.dir.join(name);

        let result = async {
            fs::create_dir_all(&self.dir)
                .await
                .map_err(|e| AppError::file_write_failed(self.dir.display().to_string(), e))?;
            fs::copy(source, &target).await.map_err(|e| {
                AppError::copy_failed(source.display().to_string(), target.display().to_string(), e)
            })
        }
        .await;

        match result {
            Ok(_) => {
                debug!("已复制到核查目录: {}", target.display());
                Ok(true)
            }
            Err(e) => {
                // 失败时释放占位，允许重试
                self.release(source);
                Err(e)
            }
        }
    }

    pub fn copied_count(&self) -> usize {
        self.copied.lock().map(|copied| copied.len()).unwrap_or(0)
    }

    fn release(&self, source: &Path) {
        if let Ok(mut copied) = self.copied.lock() {
            copied.remove(source);
        }
    }

    fn claim(&self, source: &Path) -> bool {
        match self.copied.lock() {
            Ok(mut copied) => copied.insert(source.to_path_buf()),
            Err(poisoned) => poisoned.into_inner().insert(source.to_path_buf()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_copy_once() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.jpg");
        std::fs::write(&source, b"jpeg").unwrap();
        let sink = ManualReviewSink::new(dir.path().join("lote_comp_manual"));

        assert!(sink.submit(&source, "a.jpg").await.unwrap());
        assert!(!sink.submit(&source, "a.jpg").await.unwrap());
        assert_eq!(sink.copied_count(), 1);
        assert_eq!(std::fs::read(sink.dir().join("a.jpg")).unwrap(), b"jpeg");
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_concurrent_submit_copies_once() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("b.png");
        std::fs::write(&source, b"png").unwrap();
        let sink = Arc::new(ManualReviewSink::new(dir.path().join("sink")));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sink = sink.clone();
                let source = source.clone();
                tokio::spawn(async move { sink.submit(&source, "b.png").await.unwrap() })
            })
            .collect();
        let copied = futures::future::join_all(handles)
            .await
            .into_iter()
            .filter(|r| *r.as_ref().unwrap())
            .count();
        assert_eq!(copied, 1);
    }

    #[tokio::test]
    async fn test_missing_source_fails_and_can_retry() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("missing.jpg");
        let sink = ManualReviewSink::new(dir.path().join("sink"));

        assert!(sink.submit(&source, "missing.jpg").await.is_err());
        assert_eq!(sink.copied_count(), 0);

        std::fs::write(&source, b"late").unwrap();
        assert!(sink.submit(&source, "missing.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn test_same_file_name_from_two_dirs_kept_apart() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("turma1/001.png");
        let second = dir.path().join("turma2/001.png");
        for (path, body) in [(&first, b"um"), (&second, b"do")] {
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, body).unwrap();
        }
        let sink = ManualReviewSink::new(dir.path().join("sink"));

        assert!(sink.submit(&first, "turma1_001.png").await.unwrap());
        assert!(sink.submit(&second, "turma2_001.png").await.unwrap());
        assert_eq!(sink.copied_count(), 2);
        assert_eq!(std::fs::read(sink.dir().join("turma1_001.png")).unwrap(), b"um");
        assert_eq!(std::fs::read(sink.dir().join("turma2_001.png")).unwrap(), b"do");
    }

    #[tokio::test]
    async fn test_name_with_separator_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("c.png");
        std::fs::write(&source, b"png").unwrap();
        let sink = ManualReviewSink::new(dir.path().join("sink"));

        assert!(sink.submit(&source, "../c.png").await.is_err());
        assert_eq!(sink.copied_count(), 0);
    }
}
