//! 结果落盘 - 基础设施层

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs;

use crate::config::OutputMode;
use crate::error::{AppError, AppResult};
use crate::models::report::BatchReport;

/// 批次名转文件名：序数标记 `ª º °` 变空格，空格变下划线
pub fn sanitize_batch_name(name: &str) -> String {
    name.trim()
        .replace(['ª', 'º', '°'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// 按输出方式写出批次结果
#[derive(Debug, Clone)]
pub struct ReportStore {
    output_dir: PathBuf,
    mode: OutputMode,
}

impl ReportStore {
    pub fn new(output_dir: impl Into<PathBuf>, mode: OutputMode) -> Self {
        Self {
            output_dir: output_dir.into(),
            mode,
        }
    }

    /// 写出一个批次，返回写入的文件列表
    pub async fn write(&self, report: &BatchReport) -> AppResult<Vec<PathBuf>> {
        let name = sanitize_batch_name(&report.batch);
        match self.mode {
            OutputMode::PerBatch => {
                let path = self.output_dir.join(format!("{}.json", name));
                write_json(&path, report).await?;
                Ok(vec![path])
            }
            OutputMode::PerImage => {
                let dir = self.output_dir.join(&name);
                let mut written = Vec::with_capacity(report.results.len() + 1);
                let mut stems = HashSet::new();
                for result in &report.results {
                    let stem = Path::new(&result.filename)
                        .file_stem()
                        .map(|s| s.to_string_lossy().to_string())
                        .unwrap_or_else(|| result.filename.clone());
                    // 同名结果不允许互相覆盖
                    if !stems.insert(stem.clone()) {
                        return Err(AppError::Other(format!(
                            "批次 {} 中有重名结果: {}",
                            report.batch, result.filename
                        )));
                    }
                    let path = dir.join(format!("{}.json", stem));
                    write_json(&path, result).await?;
                    written.push(path);
                }
                let path = dir.join("_failures.json");
                write_json(&path, &report.failures).await?;
                written.push(path);
                Ok(written)
            }
        }
    }
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::file_write_failed(parent.display().to_string(), e))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)
        .await
        .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;
    tracing::debug!("已写入: {}", path.display());
    Ok(())
}
