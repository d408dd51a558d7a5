//! 单个批次处理器 - 编排层
//!
//! ## 职责
//!
//! 处理一个批次（输入根目录下的一个一级子目录）的所有图片。
//!
//! ## 核心功能
//!
//! 1. **并发控制**：Semaphore 限制同时处理的图片数
//! 2. **阻塞隔离**：解码与像素计算放到 `spawn_blocking`
//! 3. **失败隔离**：单张图片的错误、超时、panic 都只记为该图片失败
//! 4. **人工核查**：身份未知的图片复制到本批次的核查目录
//! 5. **汇总输出**：在汇合点统一收集结果、回填人工对照、写出报告

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::future::join_all;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppError, ImageError, TemplateError};
use crate::infrastructure::layout_lookup::{CachedLayoutLookup, LayoutLookup};
use crate::infrastructure::report_store::ReportStore;
use crate::models::loaders::BatchSource;
use crate::models::report::{BatchReport, BatchStats, SheetFailure};
use crate::models::sheet::SheetResult;
use crate::services::manual_review::ManualReviewSink;
use crate::services::reconciliation::{reconcile, ManualMapping};
use crate::utils::logging;
use crate::workflow::{SheetCtx, SheetFlow};

/// 单张图片的处理结果
#[derive(Debug)]
pub enum SheetOutcome {
    Processed(SheetResult),
    Failed(SheetFailure),
}

/// 批次处理所需的共享资源
pub struct BatchEnv<'a> {
    pub config: &'a Config,
    pub flow: Arc<SheetFlow>,
    pub lookup: Arc<dyn LayoutLookup>,
    pub store: &'a ReportStore,
    pub manual_mapping: Option<&'a ManualMapping>,
}

/// 处理单个批次
///
/// # 返回
/// 批次报告与统计；只有报告写入失败会返回错误
pub async fn process_batch(batch: BatchSource, env: &BatchEnv<'_>) -> Result<(BatchReport, BatchStats)> {
    let total = batch.images.len();
    logging::log_batch_start(&batch.name, total, batch.skipped);

    // 每个批次一份查询缓存
    let lookup = Arc::new(CachedLayoutLookup::new(env.lookup.clone()));
    let sink = Arc::new(ManualReviewSink::new(
        batch.manual_review_dir(&env.config.manual_review_suffix),
    ));
    let semaphore = Arc::new(Semaphore::new(env.config.worker_count));
    let timeout = env.config.sheet_timeout_secs.map(Duration::from_secs);

    let mut handles = Vec::with_capacity(total);
    for (idx, image) in batch.images.iter().enumerate() {
        let ctx = SheetCtx::new(batch.name.clone(), idx + 1, total, image.path.clone())
            .with_filename(image.name.clone());
        let permit = semaphore.clone().acquire_owned().await?;

        let flow = env.flow.clone();
        let lookup = lookup.clone();
        let sink = sink.clone();
        let filename = ctx.filename.clone();

        let handle = tokio::spawn(process_sheet(ctx, flow, lookup, sink, timeout, permit));
        handles.push((filename, handle));
    }

    // ========== 汇合点：唯一的聚合步骤 ==========
    let (filenames, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
    let mut report = BatchReport::new(batch.name.clone());
    for (filename, joined) in filenames.into_iter().zip(join_all(handles).await) {
        match joined {
            Ok(SheetOutcome::Processed(result)) => report.results.push(result),
            Ok(SheetOutcome::Failed(failure)) => report.failures.push(failure),
            Err(e) => {
                error!("[批次 {}] {} 任务执行失败: {}", batch.name, filename, e);
                report.failures.push(SheetFailure {
                    filename,
                    error: format!("任务执行失败: {}", e),
                });
            }
        }
    }

    let manually_resolved = match env.manual_mapping {
        Some(mapping) => {
            let count = reconcile(&mut report.results, mapping);
            if count > 0 {
                info!("[批次 {}] 人工对照回填 {} 张", batch.name, count);
            }
            count
        }
        None => 0,
    };

    report.sort();
    let stats = BatchStats {
        processed: report.results.len(),
        unknown: report.unknown_count(),
        manually_resolved,
        failed: report.failures.len(),
        skipped: batch.skipped,
        copied_to_review: sink.copied_count(),
    };

    let written = env.store.write(&report).await?;
    for path in &written {
        tracing::debug!("[批次 {}] 输出 {}", batch.name, path.display());
    }

    logging::log_batch_complete(&batch.name, &stats);
    Ok((report, stats))
}

/// 处理一张图片，任何错误都转为 `Failed`
///
/// 许可随阻塞任务一起释放，超时后仍在后台运行的解码继续占用一个并发名额。
async fn process_sheet(
    ctx: SheetCtx,
    flow: Arc<SheetFlow>,
    lookup: Arc<CachedLayoutLookup>,
    sink: Arc<ManualReviewSink>,
    timeout: Option<Duration>,
    permit: OwnedSemaphorePermit,
) -> SheetOutcome {
    let blocking_ctx = ctx.clone();
    let task = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        flow.run_file(&blocking_ctx, lookup.as_ref())
    });

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, task).await {
            Ok(joined) => joined,
            Err(_) => {
                let err = AppError::Image(ImageError::TimedOut {
                    path: ctx.path().display().to_string(),
                    secs: limit.as_secs(),
                });
                return failed(&ctx, err.to_string());
            }
        },
        None => task.await,
    };

    let result = match joined {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            if !e.is_per_image() {
                warn!("{} 非预期的错误类型: {}", ctx, e);
            }
            // 尺寸不足的图片无法自动判读，交给人工核查
            if matches!(e, AppError::Template(TemplateError::RegionOutOfBounds { .. })) {
                submit_for_review(&ctx, &sink).await;
            }
            return failed(&ctx, e.to_string());
        }
        Err(e) => return failed(&ctx, format!("处理线程异常: {}", e)),
    };

    if result.identity.is_unknown() {
        submit_for_review(&ctx, &sink).await;
    }

    SheetOutcome::Processed(result)
}

async fn submit_for_review(ctx: &SheetCtx, sink: &ManualReviewSink) {
    match sink.submit(ctx.path(), &ctx.filename).await {
        Ok(true) => info!("{} 已复制到人工核查目录 {}", ctx, sink.dir().display()),
        Ok(false) => {}
        Err(e) => error!("{} ❌ 复制到人工核查目录失败: {}", ctx, e),
    }
}

fn failed(ctx: &SheetCtx, error: String) -> SheetOutcome {
    error!("{} ❌ 处理失败: {}", ctx, error);
    SheetOutcome::Failed(SheetFailure {
        filename: ctx.filename.clone(),
        error,
    })
}
