use std::path::PathBuf;

use anyhow::Result;
use bubble_sheet_reader::{logger, App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 可选参数：配置文件路径
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);

    // 加载配置
    let config = Config::load(config_path.as_deref())?;

    // 初始化日志
    logger::init(&config)?;

    // 初始化并运行应用
    let summary = App::initialize(config).await?.run().await?;

    if summary.stats.failed > 0 {
        tracing::warn!("⚠️ {} 张图片处理失败，详见输出中的 failures", summary.stats.failed);
    }

    Ok(())
}
