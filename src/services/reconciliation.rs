//! 人工对照 - 业务能力层
//!
//! 按文件名把人工核查得到的学生编号回填到身份未知的结果上。

use std::collections::HashMap;

use crate::models::identity::Identity;
use crate::models::sheet::SheetResult;

/// 文件名 → 学生编号（`None` 表示人工也未能确认）
pub type ManualMapping = HashMap<String, Option<String>>;

fn is_student_id(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// 回填身份
///
/// 只改写 `Unknown` 且对照表中有纯数字学生编号的结果，已解析的结果从不改动。
///
/// # 返回
/// 被改写的结果数量
pub fn reconcile(results: &mut [SheetResult], mapping: &ManualMapping) -> usize {
    let mut resolved = 0;
    for result in results.iter_mut().filter(|r| r.identity.is_unknown()) {
        let Some(Some(student_id)) = mapping.get(&result.filename) else {
            continue;
        };
        let student_id = student_id.trim();
        if !is_student_id(student_id) {
            tracing::debug!("对照表中 {} 的学生编号无效: {:?}", result.filename, student_id);
            continue;
        }

        result.identity = Identity::manually_resolved(student_id, result.identity.raw.take());
        resolved += 1;
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::identity::IdentityStatus;
    use crate::models::sheet::AttendanceBlock;

    fn result(filename: &str, identity: Identity) -> SheetResult {
        SheetResult {
            filename: filename.to_string(),
            identity,
            template: "rectangular_default".to_string(),
            attendance: AttendanceBlock {
                groups: [false; 4],
                code: 0,
            },
            answers: Vec::new(),
        }
    }

    #[test]
    fn test_reconcile_unknown_only() {
        let mut results = vec![
            result("a.jpg", Identity::unknown(Some("12-44".to_string()))),
            result("b.jpg", Identity::decoded("1", "4405", "100", "1-4405-100")),
            result("c.jpg", Identity::unknown(None)),
            result("d.jpg", Identity::unknown(None)),
            result("e.jpg", Identity::unknown(None)),
        ];
        let mapping: ManualMapping = [
            ("a.jpg", Some("59652")),
            ("b.jpg", Some("777")),
            ("c.jpg", None),
            ("d.jpg", Some("AUSENTE")),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
        .collect();

        assert_eq!(reconcile(&mut results, &mapping), 1);

        assert_eq!(results[0].identity.status, IdentityStatus::ManuallyResolved);
        assert_eq!(results[0].identity.student_id.as_deref(), Some("59652"));
        assert_eq!(results[0].identity.assessment_id, None);
        assert_eq!(results[0].identity.raw.as_deref(), Some("12-44"));

        assert_eq!(results[1].identity.student_id.as_deref(), Some("100"));
        assert!(results[2].identity.is_unknown());
        assert!(results[3].identity.is_unknown());
        assert!(results[4].identity.is_unknown());
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut results = vec![result("a.jpg", Identity::unknown(None))];
        let mapping: ManualMapping = [("a.jpg".to_string(), Some("1".to_string()))].into();
        assert_eq!(reconcile(&mut results, &mapping), 1);
        assert_eq!(reconcile(&mut results, &mapping), 0);
    }
}
