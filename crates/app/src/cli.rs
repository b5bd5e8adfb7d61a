use clap::Parser;
use std::path::PathBuf;

/// A 股多维度投资分析：估值、成长性、资金面与技术面加权评分。
#[derive(Parser, Debug)]
#[command(name = "kabu", version, about)]
pub struct Cli {
    /// 股票代码，例如 600519 或 002475
    #[arg(value_name = "CODE", required_unless_present_any = ["cache_stats", "clear_cache"])]
    pub code: Option<String>,

    /// TOML 配置文件路径
    #[arg(short, long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// 将报告同时写入该文件
    #[arg(short, long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// 输出 JSON 格式的完整分析结果，而不是 Markdown 报告
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// 跳过本地缓存，直接请求数据源
    #[arg(long = "no-cache", default_value_t = false)]
    pub no_cache: bool,

    /// 显示缓存统计后退出
    #[arg(long = "cache-stats", default_value_t = false)]
    pub cache_stats: bool,

    /// 清空缓存后退出
    #[arg(long = "clear-cache", default_value_t = false, conflicts_with = "cache_stats")]
    pub clear_cache: bool,
}
