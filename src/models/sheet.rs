use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::models::identity::Identity;
use crate::models::template::ATTENDANCE_GROUPS;

/// 出勤区标记文本
pub const MARKED: &str = "Marcado";

/// 一道题的标记集合
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkSet {
    /// 没有任何选项达到阈值
    Unmarked,
    /// 达到阈值的选项下标（从 0 开始）
    Marked(Vec<usize>),
}

impl MarkSet {
    pub fn from_indices(indices: Vec<usize>) -> Self {
        if indices.is_empty() {
            Self::Unmarked
        } else {
            Self::Marked(indices)
        }
    }

    pub fn indices(&self) -> &[usize] {
        match self {
            Self::Unmarked => &[],
            Self::Marked(indices) => indices,
        }
    }
}

/// 标记数量分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkCountClass {
    None,
    Single,
    Multiple,
}

/// 数字选项：单选为 1..=n，多选为 "N"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericAlternative {
    Choice(u8),
    Ambiguous,
}

impl Serialize for NumericAlternative {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Choice(n) => serializer.serialize_u8(*n),
            Self::Ambiguous => serializer.serialize_str("N"),
        }
    }
}

// 兼容数字与 "N" 两种写法
impl<'de> Deserialize<'de> for NumericAlternative {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Visitor;

        struct AlternativeVisitor;

        impl<'de> Visitor<'de> for AlternativeVisitor {
            type Value = NumericAlternative;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a positive integer or \"N\"")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u8::try_from(value)
                    .map(NumericAlternative::Choice)
                    .map_err(|_| E::custom(format!("选项超出范围: {}", value)))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u8::try_from(value)
                    .map(NumericAlternative::Choice)
                    .map_err(|_| E::custom(format!("选项超出范围: {}", value)))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if value == "N" {
                    Ok(NumericAlternative::Ambiguous)
                } else {
                    Err(E::custom(format!("未知的选项值: {}", value)))
                }
            }
        }

        deserializer.deserialize_any(AlternativeVisitor)
    }
}

/// 单题作答记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    #[serde(rename = "questao_id")]
    pub question_number: u32,
    /// 被标记的选项下标，未标记为 null
    #[serde(rename = "marcacoes")]
    pub marks: Option<Vec<usize>>,
    #[serde(rename = "classe")]
    pub chosen_option_count_class: MarkCountClass,
    #[serde(rename = "alternativa_id")]
    pub alternative_code: String,
    #[serde(rename = "nro_alternativa")]
    pub numeric_alternative: Option<NumericAlternative>,
}

/// 出勤区结果：每组是否标记 + 出勤代码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceBlock {
    pub groups: [bool; ATTENDANCE_GROUPS],
    pub code: u8,
}

impl Serialize for AttendanceBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        const GROUP_FIELDS: [&str; ATTENDANCE_GROUPS] = ["grupo_0", "grupo_1", "grupo_2", "grupo_3"];

        let mut state = serializer.serialize_struct("campo_de_presenca", ATTENDANCE_GROUPS + 1)?;
        for (field, marked) in GROUP_FIELDS.iter().zip(self.groups) {
            state.serialize_field(field, &marked.then_some(MARKED))?;
        }
        state.serialize_field("presenca_id", &self.code)?;
        state.end()
    }
}

/// 单张答题卡的最终结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetResult {
    pub filename: String,
    #[serde(rename = "qrcode")]
    pub identity: Identity,
    /// 实际使用的模板名称
    #[serde(rename = "modelo")]
    pub template: String,
    #[serde(rename = "campo_de_presenca")]
    pub attendance: AttendanceBlock,
    #[serde(rename = "questoes_retangulos")]
    pub answers: Vec<AnswerRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attendance_block_shape() {
        let block = AttendanceBlock {
            groups: [false, false, true, false],
            code: 5,
        };
        let value = serde_json::to_value(block).unwrap();
        assert_eq!(
            value,
            json!({
                "grupo_0": null,
                "grupo_1": null,
                "grupo_2": "Marcado",
                "grupo_3": null,
                "presenca_id": 5
            })
        );
    }

    #[test]
    fn test_numeric_alternative_accepts_number_and_n() {
        let choice: NumericAlternative = serde_json::from_str("3").unwrap();
        assert_eq!(choice, NumericAlternative::Choice(3));
        let ambiguous: NumericAlternative = serde_json::from_str("\"N\"").unwrap();
        assert_eq!(ambiguous, NumericAlternative::Ambiguous);
        assert!(serde_json::from_str::<NumericAlternative>("\"X\"").is_err());
    }

    #[test]
    fn test_mark_set_from_empty_is_unmarked() {
        assert_eq!(MarkSet::from_indices(vec![]), MarkSet::Unmarked);
        assert_eq!(MarkSet::from_indices(vec![2]).indices(), &[2]);
    }
}
