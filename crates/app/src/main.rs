use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::Parser;
use kabu_analyzer::InvestmentAnalyzer;
use kabu_app::cli::Cli;
use kabu_app::{logging, provider, report};
use kabu_core::config::AppConfig;
use tracing::{debug, info};

/// # Summary
/// 命令行入口，负责装配组件并输出报告。
///
/// # Logic
/// 1. 解析参数并加载配置。
/// 2. 初始化全局日志。
/// 3. 缓存管理命令直接处理后退出。
/// 4. 实例化数据源与缓存。
/// 5. 运行分析并输出 Markdown 或 JSON。
#[tokio::main]
async fn main() -> Result<()> {
    // 1. 解析参数、加载配置
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    // 2. 初始化日志，守卫需存活至进程结束
    let _log_guard = logging::init(&config.logging)?;
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    // 3. 缓存管理
    if cli.cache_stats || cli.clear_cache {
        let Some(cache) = provider::open_cache(&config, false).await? else {
            println!("缓存已禁用");
            return Ok(());
        };
        if cli.clear_cache {
            cache.clear_all().await.context("failed to clear cache")?;
            info!("Cache cleared");
            println!("缓存已清空");
        } else {
            let stats = cache.stats().await.context("failed to read cache stats")?;
            println!("{}", report::render_cache_stats(&stats));
        }
        return Ok(());
    }

    let Some(code) = cli.code.as_deref() else {
        bail!("stock code is required");
    };
    info!(code, "Kabu starting...");

    // 4. 实例化基础设施层
    let provider = provider::build_provider(&config, cli.no_cache).await?;

    // 5. 分析并输出
    let analyzer = InvestmentAnalyzer::new(provider, &config);
    let outcome = analyzer.analyze(code).await;
    let rendered = if cli.json {
        serde_json::to_string_pretty(&outcome).context("failed to serialize analysis outcome")?
    } else {
        report::render_markdown(&outcome, Local::now().naive_local())
    };
    println!("{}", rendered);

    if let Some(path) = &cli.output {
        tokio::fs::write(path, &rendered)
            .await
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "Report saved");
    }
    Ok(())
}
