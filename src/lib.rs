//! # Bubble Sheet Reader
//!
//! 答题卡照片批量识别：二维码身份、出勤区、作答区 → 结构化结果
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 磁盘与外部查询，只暴露能力
//! - `image_source` - 图像解码与灰度转换
//! - `LayoutLookup` - 评估 → 版式族查询（对照表 / 后缀 / 批次缓存）
//! - `ReportStore` - 批次结果落盘
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能对一张图片做什么"
//! - `canonical_frame` - 居中裁剪到标准画布
//! - `IdentityResolver` - 二维码 → 身份
//! - `TemplateSelector` - 身份 → 模板
//! - `FillAnalyzer` / `grid_decoder` - 填涂比例与标记集合
//! - `OutcomeEncoder` - 出勤代码与作答代码
//! - `ManualReviewSink` / `reconcile` - 人工核查与回填
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一张答题卡"的完整处理流程
//! - `SheetCtx` - 上下文封装（批次 + 序号 + 文件名）
//! - `SheetFlow` - 流程编排（画布 → 身份 → 模板 → 解码 → 编码）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 整体处理器，管理资源，逐批处理
//! - `orchestrator/region_processor` - 单个批次处理器，并发与汇总
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, OutputMode};
pub use error::{AppError, AppResult};
pub use models::{BatchReport, Identity, IdentityStatus, SheetResult, Template};
pub use orchestrator::{App, RunSummary};
pub use services::{CodeReader, QrCodeReader};
pub use workflow::{SheetCtx, SheetFlow};
