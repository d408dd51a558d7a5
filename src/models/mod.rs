pub mod identity;
pub mod loaders;
pub mod report;
pub mod sheet;
pub mod template;

pub use identity::{Identity, IdentityStatus};
pub use loaders::{load_layout_pair, load_lookup_table, load_manual_mapping, scan_batches, BatchSource};
pub use report::{BatchReport, BatchStats, SheetFailure};
pub use sheet::{AnswerRecord, AttendanceBlock, MarkCountClass, MarkSet, NumericAlternative, SheetResult};
pub use template::{
    AnswerRegion, AttendanceRegion, GridLayout, LayoutFamily, LayoutPair, LayoutProfile, Region,
    RegionShape, Template, ATTENDANCE_GROUPS,
};
