//! 业务能力层（Services Layer）
//!
//! 每个模块只描述"我能对一张图片做什么"，不关心批次和并发。

pub mod canonical_frame;
pub mod fill_analyzer;
pub mod grid_decoder;
pub mod identity_resolver;
pub mod manual_review;
pub mod outcome_encoder;
pub mod reconciliation;
pub mod template_selector;

pub use canonical_frame::{canonicalize, FrameLimits};
pub use fill_analyzer::{FillAnalyzer, RegionReading};
pub use grid_decoder::{decode_grid, GridReading, QuestionMarks};
pub use identity_resolver::{CodeReader, IdentityResolver, QrCodeReader};
pub use manual_review::ManualReviewSink;
pub use outcome_encoder::{AttendanceCodeTable, OutcomeEncoder};
pub use reconciliation::{reconcile, ManualMapping};
pub use template_selector::{TemplateSelector, TemplateSet};
