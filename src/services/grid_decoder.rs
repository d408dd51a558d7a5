//! 网格解码 - 业务能力层
//!
//! 按模板对出勤区和作答区逐一调用 [`FillAnalyzer`]，只回答"哪些区域被涂了"，不做任何解释。

use image::GrayImage;

use crate::error::TemplateError;
use crate::models::sheet::MarkSet;
use crate::models::template::{Template, ATTENDANCE_GROUPS};
use crate::services::fill_analyzer::FillAnalyzer;

/// 一道题的原始标记
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionMarks {
    pub question_number: u32,
    pub marks: MarkSet,
}

/// 一张答题卡的原始读数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridReading {
    /// 每个出勤组是否被标记
    pub attendance: [bool; ATTENDANCE_GROUPS],
    /// 按题号顺序，与模板题目一一对应
    pub questions: Vec<QuestionMarks>,
}

/// 解码整张答题卡
///
/// 同一分组有多个区域时，任一区域被标记即视为该组被标记。
pub fn decode_grid(
    analyzer: &FillAnalyzer,
    image: &GrayImage,
    template: &Template,
) -> Result<GridReading, TemplateError> {
    let mut attendance = [false; ATTENDANCE_GROUPS];
    for region in &template.attendance {
        let reading = analyzer.analyze(image, &region.region)?;
        if let Some(slot) = attendance.get_mut(region.group) {
            *slot |= reading.marked;
        }
    }

    let mut questions = Vec::with_capacity(template.question_count());
    for answer in &template.answers {
        let mut marked = Vec::new();
        for option in 0..answer.option_count {
            let reading = analyzer.analyze(image, &template.option_region(answer, option))?;
            if reading.marked {
                marked.push(option as usize);
            }
        }
        questions.push(QuestionMarks {
            question_number: answer.question_number,
            marks: MarkSet::from_indices(marked),
        });
    }

    Ok(GridReading {
        attendance,
        questions,
    })
}
