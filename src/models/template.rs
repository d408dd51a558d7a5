//! 答题卡区域模板
//!
//! 模板由 [`GridLayout`]（配置形式：行列数、列 x 坐标、行间距等）构建而来，
//! 构建后不可变。题号按列优先排列：先第 1 列的所有行，再第 2 列……

use serde::{Deserialize, Serialize};

use crate::error::TemplateError;

/// 出勤区分组数量（grupo_0 ~ grupo_3）
pub const ATTENDANCE_GROUPS: usize = 4;

/// 单个模板的题目数上限
pub const MAX_QUESTIONS: u32 = 1024;

/// 区域形状
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionShape {
    /// 矩形，统计整个矩形
    #[default]
    Rectangle,
    /// 圆形，统计矩形内切圆
    Circle,
}

/// 图像上的一块矩形区域（圆形区域取其内切圆）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub shape: RegionShape,
}

impl Region {
    pub fn rect(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            shape: RegionShape::Rectangle,
        }
    }

    /// 以中心点构建矩形，左上角 = 中心 - 尺寸 / 2
    pub fn centered(cx: u32, cy: u32, width: u32, height: u32) -> Self {
        Self::rect(
            cx.saturating_sub(width / 2),
            cy.saturating_sub(height / 2),
            width,
            height,
        )
    }

    /// 以圆心和半径构建圆形区域，外接框边长 2r+1
    pub fn circle(cx: u32, cy: u32, radius: u32) -> Self {
        Self {
            x: cx.saturating_sub(radius),
            y: cy.saturating_sub(radius),
            width: radius * 2 + 1,
            height: radius * 2 + 1,
            shape: RegionShape::Circle,
        }
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// 检查区域是否完整落在 `image_width x image_height` 内
    pub fn check_bounds(&self, image_width: u32, image_height: u32) -> Result<(), TemplateError> {
        let right = self.x.checked_add(self.width);
        let bottom = self.y.checked_add(self.height);
        match (right, bottom) {
            (Some(r), Some(b)) if r <= image_width && b <= image_height => Ok(()),
            _ => Err(TemplateError::RegionOutOfBounds {
                x: self.x,
                y: self.y,
                width: self.width,
                height: self.height,
                image_width,
                image_height,
            }),
        }
    }
}

/// 出勤区描述 `{x, y, width, height, group}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRegion {
    pub group: usize,
    #[serde(flatten)]
    pub region: Region,
}

/// 作答区描述：一道题的基准坐标，选项 i 位于 `x + i * option_pitch`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRegion {
    pub question_number: u32,
    pub row: u32,
    pub column: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub option_count: u32,
}

/// 模板的配置形式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    pub name: String,
    pub rows: u32,
    pub columns: u32,
    /// 每列的 x 坐标
    pub column_x: Vec<u32>,
    /// 第一行的 y 坐标
    pub row_y_base: u32,
    /// 行间距
    pub row_pitch: u32,
    /// 选项水平间距
    #[serde(default = "default_option_pitch")]
    pub option_pitch: u32,
    pub option_width: u32,
    pub option_height: u32,
    #[serde(default = "default_option_count")]
    pub option_count: u32,
    pub attendance: Vec<AttendanceRegion>,
}

fn default_option_pitch() -> u32 {
    100
}

fn default_option_count() -> u32 {
    4
}

/// 构建完成的不可变模板
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    pub name: String,
    pub rows: u32,
    pub columns: u32,
    pub option_pitch: u32,
    pub attendance: Vec<AttendanceRegion>,
    pub answers: Vec<AnswerRegion>,
}

impl Template {
    /// 从配置构建模板，按列优先生成题号 1..rows*columns
    pub fn from_layout(layout: &GridLayout) -> Result<Self, TemplateError> {
        if layout.column_x.len() != layout.columns as usize {
            return Err(TemplateError::InconsistentGrid {
                template: layout.name.clone(),
                detail: format!(
                    "columns = {} 但 column_x 有 {} 项",
                    layout.columns,
                    layout.column_x.len()
                ),
            });
        }
        if layout.rows == 0 || layout.columns == 0 {
            return Err(TemplateError::InconsistentGrid {
                template: layout.name.clone(),
                detail: "行数和列数必须大于 0".to_string(),
            });
        }

        let overflow = |detail: String| TemplateError::InconsistentGrid {
            template: layout.name.clone(),
            detail,
        };

        let count = layout
            .rows
            .checked_mul(layout.columns)
            .filter(|&count| count <= MAX_QUESTIONS)
            .ok_or_else(|| {
                overflow(format!(
                    "{} 行 x {} 列 超过题目上限 {}",
                    layout.rows, layout.columns, MAX_QUESTIONS
                ))
            })?;

        // 最后一个选项的右边界
        let options_right = |x: u32| {
            layout
                .option_count
                .saturating_sub(1)
                .checked_mul(layout.option_pitch)
                .and_then(|offset| offset.checked_add(x))
                .and_then(|left| left.checked_add(layout.option_width))
        };

        let mut answers = Vec::with_capacity(count as usize);
        for (column, &x) in layout.column_x.iter().enumerate() {
            let column = column as u32;
            if options_right(x).is_none() {
                return Err(overflow(format!("第 {} 列选项坐标溢出", column + 1)));
            }
            for row in 0..layout.rows {
                let y = row
                    .checked_mul(layout.row_pitch)
                    .and_then(|offset| offset.checked_add(layout.row_y_base))
                    .filter(|y| y.checked_add(layout.option_height).is_some())
                    .ok_or_else(|| overflow(format!("第 {} 行坐标溢出", row + 1)))?;
                answers.push(AnswerRegion {
                    question_number: column * layout.rows + row + 1,
                    row,
                    column,
                    x,
                    y,
                    width: layout.option_width,
                    height: layout.option_height,
                    option_count: layout.option_count,
                });
            }
        }

        let template = Self {
            name: layout.name.clone(),
            rows: layout.rows,
            columns: layout.columns,
            option_pitch: layout.option_pitch,
            attendance: layout.attendance.clone(),
            answers,
        };
        template.check_consistency()?;
        Ok(template)
    }

    pub fn question_count(&self) -> usize {
        self.answers.len()
    }

    /// 第 `option` 个选项的区域
    ///
    /// 坐标溢出时饱和到 `u32::MAX`，随后的边界检查会拒绝该区域。
    pub fn option_region(&self, answer: &AnswerRegion, option: u32) -> Region {
        Region::rect(
            answer.x.saturating_add(option.saturating_mul(self.option_pitch)),
            answer.y,
            answer.width,
            answer.height,
        )
    }

    /// 校验题目数量、题号顺序与出勤分组
    pub fn check_consistency(&self) -> Result<(), TemplateError> {
        let expected_len = self.rows.checked_mul(self.columns).map(|n| n as usize);
        if expected_len != Some(self.answers.len()) {
            return Err(TemplateError::InconsistentGrid {
                template: self.name.clone(),
                detail: format!(
                    "{} 行 x {} 列 与实际 {} 题不符",
                    self.rows,
                    self.columns,
                    self.answers.len()
                ),
            });
        }

        for (position, answer) in self.answers.iter().enumerate() {
            let expected = position as u32 + 1;
            let column_major = answer
                .column
                .checked_mul(self.rows)
                .and_then(|n| n.checked_add(answer.row))
                .and_then(|n| n.checked_add(1));
            if answer.question_number != expected || column_major != Some(expected) {
                return Err(TemplateError::QuestionNumbering {
                    template: self.name.clone(),
                    position,
                    expected,
                    found: answer.question_number,
                });
            }
        }

        let mut seen = [false; ATTENDANCE_GROUPS];
        for region in &self.attendance {
            match seen.get_mut(region.group) {
                Some(slot) => *slot = true,
                None => {
                    return Err(TemplateError::AttendanceGroups {
                        template: self.name.clone(),
                        detail: format!("分组 {} 超出 0..{}", region.group, ATTENDANCE_GROUPS),
                    })
                }
            }
        }
        if let Some(missing) = seen.iter().position(|present| !present) {
            return Err(TemplateError::AttendanceGroups {
                template: self.name.clone(),
                detail: format!("缺少分组 {}", missing),
            });
        }

        Ok(())
    }

    /// 校验所有区域都落在标准画布内
    pub fn check_frame(&self, frame_width: u32, frame_height: u32) -> Result<(), TemplateError> {
        let outside = |source: TemplateError| TemplateError::OutsideFrame {
            template: self.name.clone(),
            frame_width,
            frame_height,
            source: Box::new(source),
        };

        for attendance in &self.attendance {
            attendance
                .region
                .check_bounds(frame_width, frame_height)
                .map_err(outside)?;
        }
        for answer in &self.answers {
            for option in 0..answer.option_count {
                self.option_region(answer, option)
                    .check_bounds(frame_width, frame_height)
                    .map_err(outside)?;
            }
        }
        Ok(())
    }
}

/// 版式族
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutFamily {
    /// 默认版式
    Default,
    /// 低年级版式（评估编号以特定两位后缀结尾）
    LowerGrade,
}

/// 两个版式族对应的模板配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutPair {
    pub default: GridLayout,
    pub lower_grade: GridLayout,
}

/// 命名的版式配置（历史脚本的不同坐标集）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutProfile {
    /// 矩形出勤框，默认 13 行，低年级 11 行
    #[default]
    Rectangular,
    /// 圆形出勤框，11 行
    Circular,
}

impl LayoutProfile {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "rectangular" => Some(Self::Rectangular),
            "circular" => Some(Self::Circular),
            _ => None,
        }
    }

    pub fn layouts(&self) -> LayoutPair {
        match self {
            Self::Rectangular => LayoutPair {
                default: GridLayout {
                    name: "rectangular_default".to_string(),
                    rows: 13,
                    columns: 4,
                    column_x: vec![215, 765, 1298, 1840],
                    row_y_base: 1790,
                    row_pitch: 85,
                    option_pitch: 100,
                    option_width: 60,
                    option_height: 60,
                    option_count: 4,
                    attendance: rectangular_attendance(50),
                },
                lower_grade: GridLayout {
                    name: "rectangular_lower_grade".to_string(),
                    rows: 11,
                    columns: 4,
                    column_x: vec![220, 770, 1298, 1840],
                    row_y_base: 1800,
                    row_pitch: 85,
                    option_pitch: 100,
                    option_width: 60,
                    option_height: 60,
                    option_count: 4,
                    attendance: rectangular_attendance(60),
                },
            },
            Self::Circular => {
                let layout = GridLayout {
                    name: "circular".to_string(),
                    rows: 11,
                    columns: 4,
                    column_x: vec![215, 758, 1298, 1840],
                    row_y_base: 1820,
                    row_pitch: 85,
                    option_pitch: 100,
                    option_width: 60,
                    option_height: 60,
                    option_count: 4,
                    attendance: [(120, 1057, 24), (121, 1136, 22), (712, 1135, 23), (383, 1055, 21)]
                        .iter()
                        .enumerate()
                        .map(|(group, &(cx, cy, r))| AttendanceRegion {
                            group,
                            region: Region::circle(cx, cy, r),
                        })
                        .collect(),
                };
                LayoutPair {
                    default: layout.clone(),
                    lower_grade: GridLayout {
                        name: "circular_lower_grade".to_string(),
                        ..layout
                    },
                }
            }
        }
    }
}

fn rectangular_attendance(size: u32) -> Vec<AttendanceRegion> {
    [(125, 1040), (128, 1120), (720, 1120), (385, 1040)]
        .iter()
        .enumerate()
        .map(|(group, &(cx, cy))| AttendanceRegion {
            group,
            region: Region::centered(cx, cy, size, size),
        })
        .collect()
}
