//! 结果编码 - 业务能力层
//!
//! 把原始标记集合转换为出勤代码和逐题作答代码。
//!
//! - 出勤：无标记 → 0；多于一组 → 99；恰好一组 → 查表
//! - 作答：无标记 → `"{题号}"`；单选 i → `"{题号}{字母}"`，数字选项 i+1；
//!   两个及以上 → `"{题号}N"`，数字选项为 "N"

use phf::phf_map;
use serde::{Deserialize, Serialize};

use crate::models::identity::Identity;
use crate::models::sheet::{
    AnswerRecord, AttendanceBlock, MarkCountClass, MarkSet, NumericAlternative, SheetResult,
};
use crate::models::template::ATTENDANCE_GROUPS;
use crate::services::grid_decoder::GridReading;

/// 没有任何出勤组被标记
pub const NO_ATTENDANCE: u8 = 0;
/// 多个出勤组被标记
pub const AMBIGUOUS_ATTENDANCE: u8 = 99;

/// 命名的出勤代码表
///
/// `standard` 与 `swapped` 的第 2、3 组相反，两种都在实际批次中出现过。
static ATTENDANCE_PROFILES: phf::Map<&'static str, [u8; ATTENDANCE_GROUPS]> = phf_map! {
    "standard" => [2, 4, 5, 3],
    "swapped" => [2, 4, 3, 5],
};

/// 出勤组 → 出勤代码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceCodeTable {
    codes: [u8; ATTENDANCE_GROUPS],
}

impl AttendanceCodeTable {
    pub fn new(codes: [u8; ATTENDANCE_GROUPS]) -> Self {
        Self { codes }
    }

    pub fn from_profile(name: &str) -> Option<Self> {
        ATTENDANCE_PROFILES
            .get(name.trim().to_ascii_lowercase().as_str())
            .map(|codes| Self::new(*codes))
    }

    pub fn profile_names() -> impl Iterator<Item = &'static str> {
        ATTENDANCE_PROFILES.keys().copied()
    }

    pub fn code_for(&self, group: usize) -> Option<u8> {
        self.codes.get(group).copied()
    }
}

impl Default for AttendanceCodeTable {
    fn default() -> Self {
        Self::new([2, 4, 5, 3])
    }
}

/// 出勤编码
pub fn encode_attendance(groups: &[bool; ATTENDANCE_GROUPS], table: &AttendanceCodeTable) -> u8 {
    let mut marked = groups
        .iter()
        .enumerate()
        .filter(|(_, &is_marked)| is_marked)
        .map(|(group, _)| group);

    match (marked.next(), marked.next()) {
        (None, _) => NO_ATTENDANCE,
        (Some(_), Some(_)) => AMBIGUOUS_ATTENDANCE,
        (Some(group), None) => table.code_for(group).unwrap_or(NO_ATTENDANCE),
    }
}

/// 选项下标 → 字母（0 → A）
pub fn option_letter(index: usize) -> char {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map(|i| char::from(b'A' + i))
        .unwrap_or('?')
}

/// 单题编码，对 {0, 1, ≥2} 三类都有定义
pub fn encode_answer(question_number: u32, marks: &MarkSet) -> AnswerRecord {
    match marks {
        MarkSet::Unmarked => AnswerRecord {
            question_number,
            marks: None,
            chosen_option_count_class: MarkCountClass::None,
            alternative_code: question_number.to_string(),
            numeric_alternative: None,
        },
        MarkSet::Marked(indices) => match indices.as_slice() {
            [single] => AnswerRecord {
                question_number,
                marks: Some(indices.clone()),
                chosen_option_count_class: MarkCountClass::Single,
                alternative_code: format!("{}{}", question_number, option_letter(*single)),
                numeric_alternative: u8::try_from(single + 1).ok().map(NumericAlternative::Choice),
            },
            // 目前的网格解码不会产生空的 Marked，保留以防其他来源
            [] => AnswerRecord {
                question_number,
                marks: Some(Vec::new()),
                chosen_option_count_class: MarkCountClass::None,
                alternative_code: format!("{}+0", question_number),
                numeric_alternative: None,
            },
            _ => AnswerRecord {
                question_number,
                marks: Some(indices.clone()),
                chosen_option_count_class: MarkCountClass::Multiple,
                alternative_code: format!("{}N", question_number),
                numeric_alternative: Some(NumericAlternative::Ambiguous),
            },
        },
    }
}

/// 结果编码器
#[derive(Debug, Clone)]
pub struct OutcomeEncoder {
    table: AttendanceCodeTable,
}

impl OutcomeEncoder {
    pub fn new(table: AttendanceCodeTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &AttendanceCodeTable {
        &self.table
    }

    /// 组装最终结果，每道题恰好一条记录
    pub fn encode(
        &self,
        identity: Identity,
        template: &str,
        reading: &GridReading,
        filename: impl Into<String>,
    ) -> SheetResult {
        SheetResult {
            filename: filename.into(),
            identity,
            template: template.to_string(),
            attendance: AttendanceBlock {
                groups: reading.attendance,
                code: encode_attendance(&reading.attendance, &self.table),
            },
            answers: reading
                .questions
                .iter()
                .map(|q| encode_answer(q.question_number, &q.marks))
                .collect(),
        }
    }
}
