use serde::{Deserialize, Serialize};

/// 身份解析状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityStatus {
    /// 二维码解析成功
    Decoded,
    /// 二维码无法读取或格式不符
    Unknown,
    /// 由人工对照表补充
    ManuallyResolved,
}

/// 答题卡身份：课程、评估、学生
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "curso_id")]
    pub course_id: Option<String>,
    #[serde(rename = "avaliacao_id")]
    pub assessment_id: Option<String>,
    #[serde(rename = "estudante_id")]
    pub student_id: Option<String>,
    pub status: IdentityStatus,
    /// 原始二维码文本，格式不符时保留以便核查
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl Identity {
    pub fn decoded(
        course_id: impl Into<String>,
        assessment_id: impl Into<String>,
        student_id: impl Into<String>,
        raw: impl Into<String>,
    ) -> Self {
        Self {
            course_id: Some(course_id.into()),
            assessment_id: Some(assessment_id.into()),
            student_id: Some(student_id.into()),
            status: IdentityStatus::Decoded,
            raw: Some(raw.into()),
        }
    }

    pub fn unknown(raw: Option<String>) -> Self {
        Self {
            course_id: None,
            assessment_id: None,
            student_id: None,
            status: IdentityStatus::Unknown,
            raw,
        }
    }

    /// 人工补充学生编号，课程与评估保持为空
    pub fn manually_resolved(student_id: impl Into<String>, raw: Option<String>) -> Self {
        Self {
            course_id: None,
            assessment_id: None,
            student_id: Some(student_id.into()),
            status: IdentityStatus::ManuallyResolved,
            raw,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.status == IdentityStatus::Unknown
    }
}
