use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 图像读取错误
    #[error("图像错误: {0}")]
    Image(#[from] ImageError),
    /// 模板 / 区域错误
    #[error("模板错误: {0}")]
    Template(#[from] TemplateError),
    /// 版式查询错误
    #[error("版式查询错误: {0}")]
    Lookup(#[from] LookupError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// JSON 序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 图像相关错误
#[derive(Debug, Error)]
pub enum ImageError {
    /// 无法解码图像文件，单张图片终止，不影响批次
    #[error("无法读取图像 ({path}): {source}")]
    Unreadable {
        path: String,
        #[source]
        source: image::ImageError,
    },
    /// 单张图片处理超时
    #[error("图像处理超时 ({path}): 超过 {secs} 秒")]
    TimedOut { path: String, secs: u64 },
}

/// 模板与区域错误
#[derive(Debug, Error)]
pub enum TemplateError {
    /// 区域越出图像边界
    #[error(
        "区域越界: ({x}, {y}, {width}x{height}) 超出图像 {image_width}x{image_height}"
    )]
    RegionOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },
    /// 行列数与坐标数量不一致
    #[error("模板 {template} 网格不一致: {detail}")]
    InconsistentGrid { template: String, detail: String },
    /// 题号不是按列优先的 1..N
    #[error("模板 {template} 题号错误: 位置 {position} 期望 {expected}, 实际 {found}")]
    QuestionNumbering {
        template: String,
        position: usize,
        expected: u32,
        found: u32,
    },
    /// 出勤区分组不完整或越界
    #[error("模板 {template} 出勤分组错误: {detail}")]
    AttendanceGroups { template: String, detail: String },
    /// 模板在标准画布上越界（启动时校验）
    #[error("模板 {template} 在 {frame_width}x{frame_height} 画布上越界: {source}")]
    OutsideFrame {
        template: String,
        frame_width: u32,
        frame_height: u32,
        #[source]
        source: Box<TemplateError>,
    },
}

/// 外部版式查询错误
#[derive(Debug, Error)]
pub enum LookupError {
    /// 查询源不可用
    #[error("版式查询不可用: {reason}")]
    Unavailable { reason: String },
    /// 查询结果格式错误
    #[error("版式查询结果格式错误: {detail}")]
    Malformed { detail: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 复制文件失败
    #[error("复制文件失败 ({from} -> {to}): {source}")]
    CopyFailed {
        from: String,
        to: String,
        #[source]
        source: std::io::Error,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置值不合法
    #[error("配置项 {field} 不合法: {reason}")]
    Invalid { field: String, reason: String },
    /// 未知的命名配置
    #[error("未知的{kind}配置: {name}")]
    UnknownProfile { kind: String, name: String },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    ParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 正则表达式编译失败
    #[error("正则表达式错误: {0}")]
    Pattern(#[from] regex::Error),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: err,
        })
    }
}

impl From<regex::Error> for AppError {
    fn from(err: regex::Error) -> Self {
        AppError::Config(ConfigError::Pattern(err))
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建图像无法读取错误
    pub fn image_unreadable(path: impl Into<String>, source: image::ImageError) -> Self {
        AppError::Image(ImageError::Unreadable {
            path: path.into(),
            source,
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件复制错误
    pub fn copy_failed(
        from: impl Into<String>,
        to: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        AppError::File(FileError::CopyFailed {
            from: from.into(),
            to: to.into(),
            source,
        })
    }

    /// 创建配置项不合法错误
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Config(ConfigError::Invalid {
            field: field.into(),
            reason: reason.into(),
        })
    }

    /// 是否为单张图片可恢复的错误
    pub fn is_per_image(&self) -> bool {
        matches!(
            self,
            AppError::Image(_) | AppError::Template(TemplateError::RegionOutOfBounds { .. })
        )
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
