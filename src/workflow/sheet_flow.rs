//! 图片处理流程 - 流程层
//!
//! 核心职责：定义"一张答题卡"的完整处理流程
//!
//! 流程顺序：
//! 1. 标准画布（居中裁剪）
//! 2. 二维码 → 身份
//! 3. 评估编号 → 模板
//! 4. 网格解码
//! 5. 结果编码
//!
//! 全部是内存中的 CPU 计算，不挂起；由编排层放到阻塞线程里执行。

use image::GrayImage;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::image_source::load_grayscale;
use crate::infrastructure::layout_lookup::LayoutLookup;
use crate::models::sheet::SheetResult;
use crate::models::template::{LayoutFamily, LayoutPair};
use crate::services::canonical_frame::{canonicalize, FrameLimits};
use crate::services::fill_analyzer::FillAnalyzer;
use crate::services::grid_decoder::decode_grid;
use crate::services::identity_resolver::{CodeReader, IdentityResolver};
use crate::services::outcome_encoder::OutcomeEncoder;
use crate::services::template_selector::{TemplateSelector, TemplateSet};
use crate::workflow::sheet_ctx::SheetCtx;

/// 图片处理流程
///
/// - 编排单张图片的完整处理流程
/// - 不持有批次状态，可在多个任务间共享
/// - 只依赖业务能力（services）
pub struct SheetFlow {
    limits: FrameLimits,
    resolver: IdentityResolver,
    selector: TemplateSelector,
    analyzer: FillAnalyzer,
    encoder: OutcomeEncoder,
    verbose_logging: bool,
}

impl SheetFlow {
    /// 创建流程；模板在此构建并对标准画布做越界校验，失败即启动失败
    pub fn new(config: &Config, layouts: &LayoutPair) -> AppResult<Self> {
        let templates = TemplateSet::build(layouts, config.max_width, config.max_height)?;
        Ok(Self {
            limits: FrameLimits::new(config.max_width, config.max_height),
            resolver: IdentityResolver::new(config.identity_region)?,
            selector: TemplateSelector::new(templates, config.lower_grade_suffix.clone()),
            analyzer: FillAnalyzer::new(config.fill_threshold, config.ink_cutoff),
            encoder: OutcomeEncoder::new(config.attendance_table()?),
            verbose_logging: config.verbose_logging,
        })
    }

    /// 替换二维码读取实现
    pub fn with_code_reader(mut self, reader: Box<dyn CodeReader>) -> AppResult<Self> {
        let region = *self.resolver.region();
        self.resolver = IdentityResolver::with_reader(region, reader)?;
        Ok(self)
    }

    pub fn templates(&self) -> &TemplateSet {
        self.selector.templates()
    }

    /// 从磁盘读取并处理一张图片
    pub fn run_file(&self, ctx: &SheetCtx, lookup: &dyn LayoutLookup) -> AppResult<SheetResult> {
        let image = load_grayscale(ctx.path())?;
        self.run(image, ctx, lookup)
    }

    /// 处理一张已解码的图片
    pub fn run(&self, image: GrayImage, ctx: &SheetCtx, lookup: &dyn LayoutLookup) -> AppResult<SheetResult> {
        let (width, height) = image.dimensions();
        let image = canonicalize(image, &self.limits);
        debug!("{} 画布 {}x{} → {:?}", ctx, width, height, image.dimensions());

        let identity = self.resolver.resolve(&image);
        if identity.is_unknown() {
            warn!("{} ⚠️ 二维码无法识别 (原文: {:?})", ctx, identity.raw);
        }

        let (template, family) = self.selector.select(identity.assessment_id.as_deref(), lookup);
        if family == LayoutFamily::LowerGrade {
            debug!("{} 使用低年级模板 {}", ctx, template.name);
        }

        let reading = decode_grid(&self.analyzer, &image, template)?;
        let result = self.encoder.encode(identity, &template.name, &reading, ctx.filename.clone());

        if self.verbose_logging {
            info!(
                "{} ✓ 学生 {:?} | 出勤 {} | 模板 {} | {} 题",
                ctx,
                result.identity.student_id,
                result.attendance.code,
                result.template,
                result.answers.len()
            );
        }

        Ok(result)
    }
}
