use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{AppError, AppResult, ConfigError};
use crate::models::template::{LayoutProfile, Region};
use crate::services::outcome_encoder::AttendanceCodeTable;

/// 结果输出方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// 每个批次一个 JSON 文件
    #[default]
    PerBatch,
    /// 每张图片一个 JSON 文件
    PerImage,
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per_batch" => Ok(Self::PerBatch),
            "per_image" => Ok(Self::PerImage),
            other => Err(format!("未知的输出方式: {}", other)),
        }
    }
}

/// 程序配置，启动时构建一次，之后只读
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 输入根目录，每个一级子目录为一个批次
    pub input_dir: PathBuf,
    /// JSON 输出目录
    pub output_dir: PathBuf,
    /// 人工核查目录后缀
    pub manual_review_suffix: String,
    /// 填涂比例阈值（百分比）
    pub fill_threshold: f64,
    /// 标准画布宽度
    pub max_width: u32,
    /// 标准画布高度
    pub max_height: u32,
    /// 灰度 <= 此值视为墨迹
    pub ink_cutoff: u8,
    /// 二维码所在区域
    pub identity_region: Region,
    /// 出勤代码表名称
    pub attendance_profile: String,
    /// 自定义出勤代码表，覆盖 attendance_profile
    pub attendance_codes: Option<[u8; 4]>,
    /// 版式配置名称
    pub layout_profile: String,
    /// 模板 TOML 文件，覆盖 layout_profile
    pub template_path: Option<PathBuf>,
    /// 低年级版式后缀
    pub lower_grade_suffix: String,
    /// 版式查询时保留的后缀
    pub lookup_suffixes: Vec<String>,
    /// 评估 → 版式族对照表
    pub lookup_table_path: Option<PathBuf>,
    /// 同时处理的图片数量
    pub worker_count: usize,
    /// 单张图片超时（秒）
    pub sheet_timeout_secs: Option<u64>,
    pub output_mode: OutputMode,
    /// 人工对照表（文件名 → 学生编号）
    pub manual_mapping_path: Option<PathBuf>,
    /// 已处理文件清单
    pub processed_list_path: Option<PathBuf>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("reprocessamento"),
            output_dir: PathBuf::from("json_reprocessamento"),
            manual_review_suffix: "_comp_manual".to_string(),
            fill_threshold: 22.0,
            max_width: 2280,
            max_height: 3220,
            ink_cutoff: 128,
            identity_region: Region::rect(1, 1, 469, 469),
            attendance_profile: "standard".to_string(),
            attendance_codes: None,
            layout_profile: "rectangular".to_string(),
            template_path: None,
            lower_grade_suffix: "05".to_string(),
            lookup_suffixes: vec!["05".to_string(), "09".to_string()],
            lookup_table_path: None,
            worker_count: 8,
            sheet_timeout_secs: None,
            output_mode: OutputMode::PerBatch,
            manual_mapping_path: None,
            processed_list_path: None,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
        }
    }
}

impl Config {
    /// 从默认值和环境变量构建
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 读取 TOML 配置文件（可选），再叠加环境变量
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
                let base: Self = toml::from_str(&content).map_err(|source| ConfigError::ParseFailed {
                    path: path.display().to_string(),
                    source,
                })?;
                base.with_env_overrides()
            }
            None => Self::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(self) -> Self {
        Self {
            input_dir: env_var("SHEET_INPUT_DIR").map(PathBuf::from).unwrap_or(self.input_dir),
            output_dir: env_var("SHEET_OUTPUT_DIR").map(PathBuf::from).unwrap_or(self.output_dir),
            fill_threshold: env_parse("SHEET_FILL_THRESHOLD").unwrap_or(self.fill_threshold),
            max_width: env_parse("SHEET_MAX_WIDTH").unwrap_or(self.max_width),
            max_height: env_parse("SHEET_MAX_HEIGHT").unwrap_or(self.max_height),
            attendance_profile: env_var("SHEET_ATTENDANCE_PROFILE").unwrap_or(self.attendance_profile),
            layout_profile: env_var("SHEET_LAYOUT_PROFILE").unwrap_or(self.layout_profile),
            lookup_table_path: env_var("SHEET_LOOKUP_TABLE").map(PathBuf::from).or(self.lookup_table_path),
            worker_count: env_parse("SHEET_WORKER_COUNT").unwrap_or(self.worker_count),
            sheet_timeout_secs: env_parse("SHEET_TIMEOUT_SECS").or(self.sheet_timeout_secs),
            output_mode: env_parse("SHEET_OUTPUT_MODE").unwrap_or(self.output_mode),
            manual_mapping_path: env_var("SHEET_MANUAL_MAPPING").map(PathBuf::from).or(self.manual_mapping_path),
            processed_list_path: env_var("SHEET_PROCESSED_LIST").map(PathBuf::from).or(self.processed_list_path),
            verbose_logging: env_parse("SHEET_VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
            output_log_file: env_var("SHEET_OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
            ..self
        }
    }

    /// 启动时校验，任何错误都是致命的
    pub fn validate(&self) -> AppResult<()> {
        // 阈值为 0 时空区域也会被判为已标记
        if !(self.fill_threshold > 0.0 && self.fill_threshold <= 100.0) {
            return Err(AppError::invalid_config(
                "fill_threshold",
                format!("{} 不在 (0, 100] 内", self.fill_threshold),
            ));
        }
        if self.worker_count == 0 {
            return Err(AppError::invalid_config("worker_count", "必须大于 0"));
        }
        if self.max_width == 0 || self.max_height == 0 {
            return Err(AppError::invalid_config("max_width/max_height", "必须大于 0"));
        }
        if self.lower_grade_suffix.is_empty() {
            return Err(AppError::invalid_config("lower_grade_suffix", "不能为空"));
        }
        if self.template_path.is_none() {
            self.layout()?;
        }
        self.attendance_table()?;
        Ok(())
    }

    /// 解析出勤代码表
    pub fn attendance_table(&self) -> AppResult<AttendanceCodeTable> {
        match self.attendance_codes {
            Some(codes) => Ok(AttendanceCodeTable::new(codes)),
            None => AttendanceCodeTable::from_profile(&self.attendance_profile).ok_or_else(|| {
                ConfigError::UnknownProfile {
                    kind: "出勤代码".to_string(),
                    name: self.attendance_profile.clone(),
                }
                .into()
            }),
        }
    }

    /// 解析版式配置
    pub fn layout(&self) -> AppResult<LayoutProfile> {
        LayoutProfile::from_name(&self.layout_profile).ok_or_else(|| {
            ConfigError::UnknownProfile {
                kind: "版式".to_string(),
                name: self.layout_profile.clone(),
            }
            .into()
        })
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_var(key).and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.worker_count, 8);
        assert_eq!(config.attendance_table().unwrap().code_for(2), Some(5));
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        for fill_threshold in [0.0, -1.0, 120.0, f64::NAN] {
            let config = Config {
                fill_threshold,
                ..Config::default()
            };
            assert!(config.validate().is_err(), "threshold {}", fill_threshold);
        }
    }

    #[test]
    fn test_unknown_profiles_rejected() {
        let config = Config {
            attendance_profile: "nope".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AppError::Config(ConfigError::UnknownProfile { .. }))
        ));

        let config = Config {
            layout_profile: "hexagonal".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_codes_override_profile() {
        let config = Config {
            attendance_profile: "nope".to_string(),
            attendance_codes: Some([1, 2, 3, 4]),
            ..Config::default()
        };
        assert_eq!(config.attendance_table().unwrap().code_for(3), Some(4));
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            fill_threshold = 30.0
            max_height = 3240
            attendance_profile = "swapped"
            layout_profile = "circular"
            output_mode = "per_image"

            [identity_region]
            x = 1
            y = 1
            width = 400
            height = 400
            "#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.fill_threshold, 30.0);
        assert_eq!(config.max_height, 3240);
        assert_eq!(config.max_width, 2280);
        assert_eq!(config.output_mode, OutputMode::PerImage);
        assert_eq!(config.identity_region.width, 400);
        assert_eq!(config.layout().unwrap(), LayoutProfile::Circular);
        assert_eq!(config.attendance_table().unwrap().code_for(2), Some(3));
    }

    #[test]
    fn test_load_without_file_reads_env() {
        std::env::set_var("SHEET_TIMEOUT_SECS", "45");
        let config = Config::load(None).unwrap();
        std::env::remove_var("SHEET_TIMEOUT_SECS");

        assert_eq!(config.sheet_timeout_secs, Some(45));
        assert_eq!(config.fill_threshold, Config::default().fill_threshold);
    }

    #[test]
    fn test_output_mode_from_str() {
        assert_eq!("per_image".parse::<OutputMode>(), Ok(OutputMode::PerImage));
        assert!("sometimes".parse::<OutputMode>().is_err());
    }
}
