//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 整体处理器
//! - 管理应用生命周期（初始化、运行）
//! - 扫描输入目录，逐批处理
//! - 输出全局统计信息
//!
//! ### `region_processor` - 单个批次处理器
//! - 控制并发数量（Semaphore）
//! - 每张图片一个任务，汇合点统一聚合
//! - 人工核查复制、人工对照回填、写出报告
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<BatchSource>)
//!     ↓
//! region_processor (处理一个批次的 Vec<PathBuf>)
//!     ↓
//! workflow::SheetFlow (处理单张图片)
//!     ↓
//! services (能力层：画布 / 身份 / 模板 / 填涂 / 编码)
//!     ↓
//! infrastructure (基础设施：图像读取 / 版式查询 / 结果落盘)
//! ```

pub mod batch_processor;
pub mod region_processor;

pub use batch_processor::{App, RunSummary};
pub use region_processor::{process_batch, SheetOutcome};
