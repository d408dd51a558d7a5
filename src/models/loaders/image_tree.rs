use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 支持的图片扩展名（不区分大小写）
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// 批次内的一张图片
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchImage {
    pub path: PathBuf,
    /// 批次内唯一的记录名，结果、核查副本和单图输出都以它命名
    pub name: String,
}

/// 一个批次：输入根目录下的一个一级子目录
#[derive(Debug, Clone)]
pub struct BatchSource {
    pub name: String,
    pub root: PathBuf,
    pub images: Vec<BatchImage>,
    /// 因已处理而跳过的图片数
    pub skipped: usize,
}

impl BatchSource {
    /// 本批次的人工核查目录
    pub fn manual_review_dir(&self, suffix: &str) -> PathBuf {
        self.root.join(format!("{}{}", self.name, suffix))
    }
}

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// 扫描输入目录，每个一级子目录为一个批次
///
/// 批次内若存在子目录（人工核查目录除外），只扫描这些子目录；否则扫描批次目录本身。
pub async fn scan_batches(
    input_dir: &Path,
    manual_suffix: &str,
    already_processed: &HashSet<String>,
) -> Result<Vec<BatchSource>> {
    if !input_dir.is_dir() {
        anyhow::bail!("输入目录不存在: {}", input_dir.display());
    }

    let mut batches = Vec::new();
    for batch_root in list_subdirs(input_dir).await? {
        let name = batch_root
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let sink_name = format!("{}{}", name, manual_suffix);

        let image_dirs: Vec<PathBuf> = list_subdirs(&batch_root)
            .await?
            .into_iter()
            .filter(|d| d.file_name().map(|n| n.to_string_lossy() != sink_name.as_str()).unwrap_or(true))
            .collect();
        let image_dirs = if image_dirs.is_empty() {
            vec![batch_root.clone()]
        } else {
            image_dirs
        };

        let mut paths = Vec::new();
        for dir in &image_dirs {
            paths.extend(list_images(dir).await?);
        }

        let mut images = Vec::new();
        let mut skipped = 0;
        for image in assign_record_names(&name, paths)? {
            let filename = file_name_of(&image.path);
            if already_processed.contains(&filename) || already_processed.contains(&image.name) {
                tracing::debug!("跳过已处理的图片: {}", image.name);
                skipped += 1;
            } else {
                images.push(image);
            }
        }

        tracing::info!(
            "批次 {}: {} 张图片, 跳过 {} 张",
            name,
            images.len(),
            skipped
        );
        batches.push(BatchSource {
            name,
            root: batch_root,
            images,
            skipped,
        });
    }

    Ok(batches)
}

fn file_name_of(path: &Path) -> String {
    path.file_name().unwrap_or_default().to_string_lossy().to_string()
}

fn stem_of(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| name.to_string())
}

/// 给批次内的图片分配记录名
///
/// 文件名（不含扩展名）在批次内唯一时直接使用文件名；不同子目录下重名的文件
/// 加上所在子目录名作前缀，例如 `turma2_001.png`。加前缀后仍冲突则报错。
fn assign_record_names(batch: &str, paths: Vec<PathBuf>) -> Result<Vec<BatchImage>> {
    let mut stem_counts: HashMap<String, usize> = HashMap::new();
    for path in &paths {
        *stem_counts.entry(stem_of(&file_name_of(path))).or_default() += 1;
    }

    let images: Vec<BatchImage> = paths
        .into_iter()
        .map(|path| {
            let filename = file_name_of(&path);
            let name = if stem_counts.get(&stem_of(&filename)).copied().unwrap_or(0) > 1 {
                let parent = path
                    .parent()
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                tracing::warn!("批次 {} 中文件名重复，记录名改为 {}_{}", batch, parent, filename);
                format!("{}_{}", parent, filename)
            } else {
                filename
            };
            BatchImage { path, name }
        })
        .collect();

    let mut seen = HashSet::new();
    for image in &images {
        if !seen.insert(stem_of(&image.name)) {
            anyhow::bail!(
                "批次 {} 中无法区分同名图片: {}",
                batch,
                image.path.display()
            );
        }
    }
    Ok(images)
}

/// 列出目录下的图片文件（不递归，按路径排序）
pub async fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("无法读取文件夹: {}", dir.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && is_image(&path) {
            images.push(path);
        }
    }

    images.sort();
    Ok(images)
}

async fn list_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("无法读取文件夹: {}", dir.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            dirs.push(entry.path());
        }
    }

    dirs.sort();
    Ok(dirs)
}

/// 加载已处理文件清单，每行一个文件名，忽略空行和 `#` 注释
pub async fn load_skip_list(path: &Path) -> Result<HashSet<String>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取已处理清单: {}", path.display()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_is_image_case_insensitive() {
        assert!(is_image(Path::new("a/b/c.JPG")));
        assert!(is_image(Path::new("c.jpeg")));
        assert!(is_image(Path::new("c.Png")));
        assert!(!is_image(Path::new("c.tif")));
        assert!(!is_image(Path::new("noext")));
    }

    #[tokio::test]
    async fn test_scan_batches_with_and_without_subdirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        // 批次 A：有子目录，根目录下的图片不扫描
        touch(&root.join("A/turma1/1.jpg"));
        touch(&root.join("A/turma2/2.png"));
        touch(&root.join("A/ignored.jpg"));
        touch(&root.join("A/A_comp_manual/old.jpg"));
        // 批次 B：无子目录
        touch(&root.join("B/3.jpeg"));
        touch(&root.join("B/notes.txt"));

        let batches = scan_batches(root, "_comp_manual", &HashSet::new()).await.unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].name, "A");
        let names: Vec<_> = batches[0].images.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["1.jpg", "2.png"]);
        assert_eq!(batches[1].images.len(), 1);
        assert_eq!(
            batches[1].manual_review_dir("_comp_manual"),
            root.join("B/B_comp_manual")
        );
    }

    #[tokio::test]
    async fn test_scan_batches_skips_processed() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("A/1.jpg"));
        touch(&dir.path().join("A/2.jpg"));

        let list_path = dir.path().join("processed.txt");
        std::fs::write(&list_path, "# 已处理\n1.jpg\n\n").unwrap();
        let skip = load_skip_list(&list_path).await.unwrap();

        let batches = scan_batches(dir.path(), "_comp_manual", &skip).await.unwrap();
        let batch = batches.iter().find(|b| b.name == "A").unwrap();
        assert_eq!(batch.images.len(), 1);
        assert_eq!(batch.skipped, 1);
    }

    #[tokio::test]
    async fn test_duplicate_names_across_subdirs_get_prefixed() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("Lote/turma1/001.png"));
        touch(&dir.path().join("Lote/turma2/001.png"));
        touch(&dir.path().join("Lote/turma2/002.png"));

        let batches = scan_batches(dir.path(), "_comp_manual", &HashSet::new()).await.unwrap();
        let names: Vec<_> = batches[0].images.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["turma1_001.png", "turma2_001.png", "002.png"]);
        assert_eq!(batches[0].images[1].path, dir.path().join("Lote/turma2/001.png"));

        // 已处理清单可以用记录名精确跳过其中一张
        let skip: HashSet<String> = ["turma1_001.png".to_string()].into_iter().collect();
        let batches = scan_batches(dir.path(), "_comp_manual", &skip).await.unwrap();
        assert_eq!(batches[0].images.len(), 2);
        assert_eq!(batches[0].skipped, 1);
    }

    #[tokio::test]
    async fn test_same_stem_in_one_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("Lote/001.jpg"));
        touch(&dir.path().join("Lote/001.png"));

        let result = scan_batches(dir.path(), "_comp_manual", &HashSet::new()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_scan_missing_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = scan_batches(&dir.path().join("missing"), "_comp_manual", &HashSet::new()).await;
        assert!(result.is_err());
    }
}
