use crate::models::template::LayoutPair;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

/// 评估表中的一行：评估编号 → 版式族编号
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LookupRow {
    #[serde(rename = "avaliacao_id")]
    pub assessment_id: String,
    /// 版式族编号，缺省时使用评估编号本身
    #[serde(rename = "simulado_id", default)]
    pub family_code: Option<String>,
}

impl LookupRow {
    pub fn family_code(&self) -> &str {
        self.family_code.as_deref().unwrap_or(&self.assessment_id)
    }
}

#[derive(Debug, Deserialize)]
struct LookupTableFile {
    #[serde(default, rename = "avaliacoes")]
    assessments: Vec<LookupRow>,
}

/// 从 TOML 文件加载模板（default + lower_grade）
pub async fn load_layout_pair(toml_file_path: &Path) -> Result<LayoutPair> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取模板文件: {}", toml_file_path.display()))?;

    let pair: LayoutPair = toml::from_str(&content)
        .with_context(|| format!("无法解析模板文件: {}", toml_file_path.display()))?;

    tracing::info!(
        "已加载模板: {} / {}",
        pair.default.name,
        pair.lower_grade.name
    );

    Ok(pair)
}

/// 从 TOML 文件加载评估 → 版式族对照表
pub async fn load_lookup_table(toml_file_path: &Path) -> Result<Vec<LookupRow>> {
    if !toml_file_path.exists() {
        anyhow::bail!("对照表不存在: {}", toml_file_path.display());
    }

    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取对照表: {}", toml_file_path.display()))?;

    let table: LookupTableFile = toml::from_str(&content)
        .with_context(|| format!("无法解析对照表: {}", toml_file_path.display()))?;

    tracing::info!("成功加载 {} 条评估记录", table.assessments.len());

    Ok(table.assessments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_lookup_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avaliacoes.toml");
        std::fs::write(
            &path,
            r#"
            [[avaliacoes]]
            avaliacao_id = "4405"
            simulado_id = "505"

            [[avaliacoes]]
            avaliacao_id = "4409"
            "#,
        )
        .unwrap();

        let rows = load_lookup_table(&path).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].family_code(), "505");
        assert_eq!(rows[1].family_code(), "4409");
    }

    #[tokio::test]
    async fn test_load_missing_lookup_table_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_lookup_table(&dir.path().join("nope.toml")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_layout_pair() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.toml");
        let mut text = String::new();
        for (section, rows) in [("default", 13), ("lower_grade", 11)] {
            text.push_str(&format!(
                r#"
                [{section}]
                name = "{section}"
                rows = {rows}
                columns = 2
                column_x = [215, 765]
                row_y_base = 1790
                row_pitch = 85
                option_width = 60
                option_height = 60
                "#
            ));
            for (group, x) in [(0, 100), (1, 200), (2, 300), (3, 400)] {
                text.push_str(&format!(
                    r#"
                    [[{section}.attendance]]
                    group = {group}
                    x = {x}
                    y = 1000
                    width = 49
                    height = 49
                    shape = "circle"
                    "#
                ));
            }
        }
        std::fs::write(&path, text).unwrap();

        let loaded = load_layout_pair(&path).await.unwrap();
        assert_eq!(loaded.default.rows, 13);
        assert_eq!(loaded.lower_grade.rows, 11);
        assert_eq!(loaded.default.option_pitch, 100);
        assert_eq!(loaded.default.option_count, 4);
        assert_eq!(loaded.default.attendance[2].region.x, 300);
        assert_eq!(
            loaded.default.attendance[0].region.shape,
            crate::models::template::RegionShape::Circle
        );
    }
}
