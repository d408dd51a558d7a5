use anyhow::{Context, Result};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

/// 加载人工对照表：`{ "文件名": "学生编号" }`
///
/// 学生编号可以是字符串或整数；`null` 或无法识别的值视为仍未知。
pub async fn load_manual_mapping(json_file_path: &Path) -> Result<HashMap<String, Option<String>>> {
    let content = fs::read_to_string(json_file_path)
        .await
        .with_context(|| format!("无法读取人工对照表: {}", json_file_path.display()))?;

    let value: JsonValue = serde_json::from_str(&content)
        .with_context(|| format!("无法解析人工对照表: {}", json_file_path.display()))?;

    let JsonValue::Object(entries) = value else {
        anyhow::bail!("人工对照表必须是 JSON 对象: {}", json_file_path.display());
    };

    let mapping: HashMap<String, Option<String>> = entries
        .into_iter()
        .map(|(filename, student)| {
            let student_id = match student {
                JsonValue::String(s) => Some(s.trim().to_string()),
                // 表格导出时学生编号常被写成浮点数，例如 59652.0
                JsonValue::Number(n) => n
                    .as_u64()
                    .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64))
                    .map(|id| id.to_string()),
                _ => None,
            };
            (filename, student_id)
        })
        .collect();

    tracing::info!("成功加载 {} 条人工对照记录", mapping.len());

    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_manual_mapping_mixed_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manual.json");
        std::fs::write(
            &path,
            r#"{ "a.jpg": "59652", "b.jpg": 1234, "c.jpg": 77.0, "d.jpg": null, "e.jpg": true }"#,
        )
        .unwrap();

        let mapping = load_manual_mapping(&path).await.unwrap();
        assert_eq!(mapping["a.jpg"].as_deref(), Some("59652"));
        assert_eq!(mapping["b.jpg"].as_deref(), Some("1234"));
        assert_eq!(mapping["c.jpg"].as_deref(), Some("77"));
        assert_eq!(mapping["d.jpg"], None);
        assert_eq!(mapping["e.jpg"], None);
    }

    #[tokio::test]
    async fn test_load_manual_mapping_rejects_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manual.json");
        std::fs::write(&path, "[]").unwrap();
        assert!(load_manual_mapping(&path).await.is_err());
    }
}
