//! # ftbadge 主程序
//!
//! 42 intra 用户徽章渲染服务

use ftbadge::{config, logging, server};

#[tokio::main]
async fn main() {
    // 初始化日志系统
    logging::init_logging(None);

    let config = match config::load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("配置加载失败: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!("服务启动");
    if let Err(e) = server::run(config).await {
        tracing::error!("服务启动失败: {e:?}");
        std::process::exit(1);
    }

    tracing::info!("服务正常关闭");
}
