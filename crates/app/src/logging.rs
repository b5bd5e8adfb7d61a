use anyhow::{Result, anyhow};
use kabu_core::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, prelude::*};

/// # Summary
/// 初始化全局日志。
///
/// # Logic
/// 1. `RUST_LOG` 优先，否则使用配置中的级别。
/// 2. 日志写到标准错误，标准输出留给报告。
/// 3. 配置了目录时，额外按日滚动写入 `kabu.log`。
///
/// # Returns
/// 文件日志的后台写入守卫，调用方需持有至进程退出；未启用文件日志时为 `None`。
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match &config.directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .map_err(|e| anyhow!("failed to create log directory {}: {}", dir.display(), e))?;
            let appender = tracing_appender::rolling::daily(dir, "kabu.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(file_layer)
                .try_init()
                .map_err(|e| anyhow!("failed to initialize tracing: {}", e))?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .try_init()
                .map_err(|e| anyhow!("failed to initialize tracing: {}", e))?;
            Ok(None)
        }
    }
}
