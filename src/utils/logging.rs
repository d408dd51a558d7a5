use anyhow::{Context, Result};
/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use std::fs;
use tracing::info;

use crate::config::Config;
use crate::models::report::BatchStats;

/// 初始化日志文件，写入带时间戳的表头（覆盖旧内容）
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n答题卡识别日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法写入日志文件: {}", log_file_path))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 答题卡批量识别");
    info!("📂 输入目录: {}", config.input_dir.display());
    info!("📂 输出目录: {}", config.output_dir.display());
    info!("📊 并发数: {} | 填涂阈值: {}%", config.worker_count, config.fill_threshold);
    info!("{}", "=".repeat(60));
}

/// 记录批次扫描结果
pub fn log_batches_found(total: usize, worker_count: usize) {
    info!("✓ 找到 {} 个待处理的批次", total);
    info!("📋 每批内最多同时处理 {} 张图片", worker_count);
    info!("💡 每批完成后再开始下一批\n");
}

/// 记录批次开始信息
pub fn log_batch_start(batch: &str, images: usize, skipped: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理批次: {}", batch);
    info!("📄 待处理 {} 张, 已跳过 {} 张", images, skipped);
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
pub fn log_batch_complete(batch: &str, stats: &BatchStats) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 批次 {} 完成: 成功 {}/{} | 身份未知 {} | 人工回填 {}",
        batch,
        stats.processed,
        stats.processed + stats.failed,
        stats.unknown,
        stats.manually_resolved
    );
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(stats: &BatchStats, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}", stats.processed);
    info!("❓ 身份未知: {} (复制到核查目录 {})", stats.unknown, stats.copied_to_review);
    info!("✍️ 人工回填: {}", stats.manually_resolved);
    info!("⏭️ 跳过: {}", stats.skipped);
    info!("❌ 失败: {}", stats.failed);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}
