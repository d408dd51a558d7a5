//! 模板选择 - 业务能力层
//!
//! 评估编号经外部查询得到版式族编号，以低年级后缀结尾时用低年级模板，否则用默认模板。
//! 评估编号缺失、查询无结果或查询失败都回退到默认模板。

use crate::error::TemplateError;
use crate::infrastructure::layout_lookup::LayoutLookup;
use crate::models::template::{LayoutFamily, LayoutPair, Template};

/// 两个版式族的模板，启动时构建并校验
#[derive(Debug, Clone)]
pub struct TemplateSet {
    pub default: Template,
    pub lower_grade: Template,
}

impl TemplateSet {
    /// 构建模板并检查它们完整落在标准画布内
    pub fn build(pair: &LayoutPair, frame_width: u32, frame_height: u32) -> Result<Self, TemplateError> {
        let default = Template::from_layout(&pair.default)?;
        let lower_grade = Template::from_layout(&pair.lower_grade)?;
        default.check_frame(frame_width, frame_height)?;
        lower_grade.check_frame(frame_width, frame_height)?;

        tracing::info!(
            "模板就绪: {} ({} 题) / {} ({} 题)",
            default.name,
            default.question_count(),
            lower_grade.name,
            lower_grade.question_count()
        );
        Ok(Self {
            default,
            lower_grade,
        })
    }

    pub fn get(&self, family: LayoutFamily) -> &Template {
        match family {
            LayoutFamily::Default => &self.default,
            LayoutFamily::LowerGrade => &self.lower_grade,
        }
    }
}

/// 模板选择器
#[derive(Debug, Clone)]
pub struct TemplateSelector {
    templates: TemplateSet,
    lower_grade_suffix: String,
}

impl TemplateSelector {
    pub fn new(templates: TemplateSet, lower_grade_suffix: impl Into<String>) -> Self {
        Self {
            templates,
            lower_grade_suffix: lower_grade_suffix.into(),
        }
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    /// 判定版式族
    pub fn family(&self, assessment_id: Option<&str>, lookup: &dyn LayoutLookup) -> LayoutFamily {
        let Some(assessment_id) = assessment_id else {
            return LayoutFamily::Default;
        };

        match lookup.family_code(assessment_id) {
            Ok(Some(code)) if code.ends_with(self.lower_grade_suffix.as_str()) => LayoutFamily::LowerGrade,
            Ok(_) => LayoutFamily::Default,
            Err(e) => {
                tracing::warn!("⚠️ 评估 {} 版式查询失败，使用默认模板: {}", assessment_id, e);
                LayoutFamily::Default
            }
        }
    }

    /// 选择模板
    pub fn select(&self, assessment_id: Option<&str>, lookup: &dyn LayoutLookup) -> (&Template, LayoutFamily) {
        let family = self.family(assessment_id, lookup);
        (self.templates.get(family), family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LookupError;
    use crate::infrastructure::layout_lookup::SuffixLayoutLookup;
    use crate::models::template::LayoutProfile;

    struct Broken;

    impl LayoutLookup for Broken {
        fn family_code(&self, _assessment_id: &str) -> Result<Option<String>, LookupError> {
            Err(LookupError::Unavailable {
                reason: "超时".to_string(),
            })
        }
    }

    struct Fixed(&'static str);

    impl LayoutLookup for Fixed {
        fn family_code(&self, _assessment_id: &str) -> Result<Option<String>, LookupError> {
            Ok(Some(self.0.to_string()))
        }
    }

    fn selector() -> TemplateSelector {
        let set = TemplateSet::build(&LayoutProfile::Rectangular.layouts(), 2280, 3220).unwrap();
        TemplateSelector::new(set, "05")
    }

    fn suffix_lookup() -> SuffixLayoutLookup {
        SuffixLayoutLookup::new(vec!["05".to_string(), "09".to_string()])
    }

    #[test]
    fn test_lower_grade_suffix_selects_alternate_template() {
        let selector = selector();
        let (template, family) = selector.select(Some("4405"), &suffix_lookup());
        assert_eq!(family, LayoutFamily::LowerGrade);
        assert_eq!(template.question_count(), 44);

        let (template, family) = selector.select(Some("4409"), &suffix_lookup());
        assert_eq!(family, LayoutFamily::Default);
        assert_eq!(template.question_count(), 52);
    }

    #[test]
    fn test_family_code_decides_not_assessment_id() {
        let selector = selector();
        assert_eq!(selector.family(Some("1234"), &Fixed("305")), LayoutFamily::LowerGrade);
        assert_eq!(selector.family(Some("1205"), &Fixed("309")), LayoutFamily::Default);
    }

    #[test]
    fn test_fallbacks_use_default_template() {
        let selector = selector();
        assert_eq!(selector.family(None, &suffix_lookup()), LayoutFamily::Default);
        assert_eq!(selector.family(Some("4401"), &suffix_lookup()), LayoutFamily::Default);
        assert_eq!(selector.family(Some("4405"), &Broken), LayoutFamily::Default);
    }

    #[test]
    fn test_template_outside_frame_rejected() {
        let err = TemplateSet::build(&LayoutProfile::Rectangular.layouts(), 2000, 3220).unwrap_err();
        assert!(matches!(err, TemplateError::OutsideFrame { .. }));
    }
}
