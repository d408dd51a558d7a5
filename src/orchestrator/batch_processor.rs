//! 批量处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责整棵输入目录的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：加载模板、对照表、已处理清单，启动期错误全部致命
//! 2. **批次扫描**：输入根目录下每个一级子目录为一个批次
//! 3. **逐批处理**：每批完成后再开始下一批，批内并发交给 region_processor
//! 4. **全局统计**：汇总所有批次的处理结果

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, FileError};
use crate::infrastructure::layout_lookup::{LayoutLookup, SuffixLayoutLookup, TableLayoutLookup};
use crate::infrastructure::report_store::ReportStore;
use crate::models::loaders::{load_layout_pair, load_manual_mapping, load_skip_list, scan_batches};
use crate::models::report::{BatchReport, BatchStats};
use crate::orchestrator::region_processor::{self, BatchEnv};
use crate::services::identity_resolver::CodeReader;
use crate::services::reconciliation::ManualMapping;
use crate::utils::logging;
use crate::workflow::SheetFlow;

/// 一次运行的结果
#[derive(Debug, Default)]
pub struct RunSummary {
    pub batches: usize,
    pub stats: BatchStats,
    pub reports: Vec<BatchReport>,
}

/// 应用主结构
pub struct App {
    config: Config,
    flow: Arc<SheetFlow>,
    lookup: Arc<dyn LayoutLookup>,
    store: ReportStore,
    manual_mapping: Option<ManualMapping>,
    skip_list: HashSet<String>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        Self::build(config, None).await
    }

    /// 使用指定的二维码读取实现初始化
    pub async fn initialize_with_reader(config: Config, reader: Box<dyn CodeReader>) -> Result<Self> {
        Self::build(config, Some(reader)).await
    }

    async fn build(config: Config, reader: Option<Box<dyn CodeReader>>) -> Result<Self> {
        config.validate()?;
        logging::log_startup(&config);

        if !config.input_dir.is_dir() {
            return Err(AppError::File(FileError::DirectoryNotFound {
                path: config.input_dir.display().to_string(),
            })
            .into());
        }

        let layouts = match &config.template_path {
            Some(path) => load_layout_pair(path).await?,
            None => config.layout()?.layouts(),
        };

        let flow = SheetFlow::new(&config, &layouts).context("模板校验失败")?;
        let flow = match reader {
            Some(reader) => flow.with_code_reader(reader)?,
            None => flow,
        };

        let lookup: Arc<dyn LayoutLookup> = match &config.lookup_table_path {
            Some(path) => Arc::new(TableLayoutLookup::load(path, &config.lookup_suffixes).await?),
            None => {
                info!("未配置版式对照表，按评估编号后缀判定");
                Arc::new(SuffixLayoutLookup::new(config.lookup_suffixes.clone()))
            }
        };

        let manual_mapping = match &config.manual_mapping_path {
            Some(path) => Some(load_manual_mapping(path).await?),
            None => None,
        };

        let skip_list = match &config.processed_list_path {
            Some(path) => {
                let list = load_skip_list(path).await?;
                info!("已处理清单: {} 个文件", list.len());
                list
            }
            None => HashSet::new(),
        };

        let store = ReportStore::new(config.output_dir.clone(), config.output_mode);

        Ok(Self {
            config,
            flow: Arc::new(flow),
            lookup,
            store,
            manual_mapping,
            skip_list,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunSummary> {
        info!("\n📁 正在扫描输入目录: {}", self.config.input_dir.display());
        let batches = scan_batches(
            &self.config.input_dir,
            &self.config.manual_review_suffix,
            &self.skip_list,
        )
        .await?;

        let mut summary = RunSummary {
            batches: batches.len(),
            ..Default::default()
        };

        if batches.is_empty() {
            warn!("⚠️ 没有找到待处理的批次，程序结束");
            return Ok(summary);
        }
        logging::log_batches_found(batches.len(), self.config.worker_count);

        let env = BatchEnv {
            config: &self.config,
            flow: self.flow.clone(),
            lookup: self.lookup.clone(),
            store: &self.store,
            manual_mapping: self.manual_mapping.as_ref(),
        };

        for batch in batches {
            let name = batch.name.clone();
            let (report, stats) = region_processor::process_batch(batch, &env)
                .await
                .with_context(|| format!("批次 {} 输出失败", name))?;
            summary.stats.merge(&stats);
            summary.reports.push(report);
        }

        logging::print_final_stats(&summary.stats, &self.config.output_log_file);
        Ok(summary)
    }
}
