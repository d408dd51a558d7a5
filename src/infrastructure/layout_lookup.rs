//! 版式查询 - 基础设施层
//!
//! 评估编号 → 版式族编号的外部查询。引擎只读，不关心数据来自文件还是数据库。

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::error::LookupError;
use crate::models::loaders::{load_lookup_table, LookupRow};

/// 外部版式查询
///
/// 查询在阻塞线程里执行，实现必须是同步且线程安全的。
pub trait LayoutLookup: Send + Sync {
    /// 查询评估编号对应的版式族编号；没有匹配返回 `Ok(None)`
    fn family_code(&self, assessment_id: &str) -> Result<Option<String>, LookupError>;
}

fn has_suffix(id: &str, suffixes: &[String]) -> bool {
    suffixes.iter().any(|suffix| id.ends_with(suffix.as_str()))
}

/// 基于对照表的查询，只保留后缀匹配的评估
#[derive(Debug, Clone, Default)]
pub struct TableLayoutLookup {
    rows: HashMap<String, String>,
}

impl TableLayoutLookup {
    pub fn from_rows(rows: Vec<LookupRow>, suffixes: &[String]) -> Self {
        let rows = rows
            .into_iter()
            .filter(|row| has_suffix(&row.assessment_id, suffixes))
            .map(|row| {
                let code = row.family_code().to_string();
                (row.assessment_id, code)
            })
            .collect();
        Self { rows }
    }

    /// 从 TOML 对照表加载
    pub async fn load(path: &Path, suffixes: &[String]) -> Result<Self> {
        let rows = load_lookup_table(path).await?;
        let lookup = Self::from_rows(rows, suffixes);
        tracing::info!("版式对照表: {} 条记录后缀匹配", lookup.len());
        Ok(lookup)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl LayoutLookup for TableLayoutLookup {
    fn family_code(&self, assessment_id: &str) -> Result<Option<String>, LookupError> {
        match self.rows.get(assessment_id) {
            Some(code) if code.trim().is_empty() => Err(LookupError::Malformed {
                detail: format!("评估 {} 的版式族编号为空", assessment_id),
            }),
            Some(code) => Ok(Some(code.trim().to_string())),
            None => Ok(None),
        }
    }
}

/// 没有对照表时的查询：评估编号本身以指定后缀结尾即视为匹配
#[derive(Debug, Clone)]
pub struct SuffixLayoutLookup {
    suffixes: Vec<String>,
}

impl SuffixLayoutLookup {
    pub fn new(suffixes: Vec<String>) -> Self {
        Self { suffixes }
    }
}

impl LayoutLookup for SuffixLayoutLookup {
    fn family_code(&self, assessment_id: &str) -> Result<Option<String>, LookupError> {
        Ok(has_suffix(assessment_id, &self.suffixes).then(|| assessment_id.to_string()))
    }
}

/// 单个评估编号的缓存槽，`None` 表示尚未成功查询
type CacheSlot = Arc<Mutex<Option<Option<String>>>>;

/// 批次内缓存：每个评估编号只查询一次，查询失败不缓存
///
/// 同一编号的并发查询在该编号的槽上排队，不同编号互不阻塞。
pub struct CachedLayoutLookup {
    inner: Arc<dyn LayoutLookup>,
    cache: Mutex<HashMap<String, CacheSlot>>,
}

impl CachedLayoutLookup {
    pub fn new(inner: Arc<dyn LayoutLookup>) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// 已成功缓存的评估编号数
    pub fn cached_len(&self) -> usize {
        let slots: Vec<CacheSlot> = match self.cache.lock() {
            Ok(cache) => cache.values().cloned().collect(),
            Err(_) => return 0,
        };
        slots
            .iter()
            .filter(|slot| slot.lock().map(|value| value.is_some()).unwrap_or(false))
            .count()
    }

    fn slot(&self, assessment_id: &str) -> CacheSlot {
        let mut cache = match self.cache.lock() {
            Ok(cache) => cache,
            Err(poisoned) => poisoned.into_inner(),
        };
        cache.entry(assessment_id.to_string()).or_default().clone()
    }
}

impl LayoutLookup for CachedLayoutLookup {
    fn family_code(&self, assessment_id: &str) -> Result<Option<String>, LookupError> {
        let slot = self.slot(assessment_id);
        let mut value = match slot.lock() {
            Ok(value) => value,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(hit) = value.as_ref() {
            return Ok(hit.clone());
        }

        let code = self.inner.family_code(assessment_id)?;
        *value = Some(code.clone());
        Ok(code)
    }
}
