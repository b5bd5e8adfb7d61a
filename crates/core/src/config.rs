use crate::common::{Adjustment, Dimension};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// # Summary
/// 配置加载错误。
#[derive(Error, Debug)]
pub enum ConfigError {
    // 配置源读取或反序列化失败
    #[error("Config load error: {0}")]
    Load(#[from] config::ConfigError),
    // 配置值语义非法
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// # Summary
/// 全局应用配置。
///
/// # Invariants
/// - 所有分节都带有默认值，配置文件只需覆盖关心的字段。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub indicator: IndicatorConfig,
    pub signal: SignalConfig,
    pub weights: ScoreWeights,
    pub cache: CacheConfig,
    pub feed: FeedConfig,
    pub logging: LoggingConfig,
}

/// 单次分析流程的参数。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // 拉取日线的回溯天数 (自然日)
    pub history_days: i64,
    // 复权方式
    pub adjustment: Adjustment,
    // 技术面评分所需的最少 K 线数量
    pub min_technical_bars: usize,
    // 资金面统计窗口
    pub fund_flow_window: usize,
    // 资金面近期窗口
    pub fund_flow_recent: usize,
    // 参与综合评分的维度
    pub dimensions: Vec<Dimension>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            history_days: 365,
            adjustment: Adjustment::Qfq,
            min_technical_bars: 61,
            fund_flow_window: 10,
            fund_flow_recent: 3,
            dimensions: Dimension::ALL.to_vec(),
        }
    }
}

/// 日线回溯天数上限，约一百年。
pub const MAX_HISTORY_DAYS: i64 = 36_500;

impl AnalysisConfig {
    pub fn is_enabled(&self, dimension: Dimension) -> bool {
        self.dimensions.contains(&dimension)
    }

    /// # Summary
    /// 校验分析流程参数。
    ///
    /// # Returns
    /// 回溯天数不在 `[1, MAX_HISTORY_DAYS]` 内，或资金面窗口为 0 时返回 `ConfigError::Invalid`。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_HISTORY_DAYS).contains(&self.history_days) {
            return Err(ConfigError::Invalid(format!(
                "analysis.history_days must be within 1..={}, got {}",
                MAX_HISTORY_DAYS, self.history_days
            )));
        }
        if self.fund_flow_window == 0 || self.fund_flow_recent == 0 {
            return Err(ConfigError::Invalid(
                "analysis.fund_flow_window and analysis.fund_flow_recent must be positive"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// # Summary
/// 技术指标参数。
///
/// # Invariants
/// - 所有周期均为正整数；MACD 快线周期小于慢线周期。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub ma_periods: Vec<usize>,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub rsi_periods: Vec<usize>,
    pub kdj_period: usize,
    pub kdj_k_smoothing: usize,
    pub kdj_d_smoothing: usize,
    pub boll_period: usize,
    pub boll_width: f64,
    pub volume_ratio_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ma_periods: vec![5, 10, 20, 60],
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            rsi_periods: vec![6, 12, 24],
            kdj_period: 9,
            kdj_k_smoothing: 3,
            kdj_d_smoothing: 3,
            boll_period: 20,
            boll_width: 2.0,
            volume_ratio_period: 5,
        }
    }
}

impl IndicatorConfig {
    /// # Summary
    /// 校验指标参数。
    ///
    /// # Returns
    /// 任一周期为 0 或快慢线颠倒时返回 `ConfigError::Invalid`。
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scalars = [
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("kdj_period", self.kdj_period),
            ("kdj_k_smoothing", self.kdj_k_smoothing),
            ("kdj_d_smoothing", self.kdj_d_smoothing),
            ("boll_period", self.boll_period),
            ("volume_ratio_period", self.volume_ratio_period),
        ];
        if let Some((name, _)) = scalars.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::Invalid(format!("indicator.{} must be positive", name)));
        }
        if self.ma_periods.contains(&0) || self.rsi_periods.contains(&0) {
            return Err(ConfigError::Invalid(
                "indicator periods must be positive".to_string(),
            ));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(ConfigError::Invalid(
                "indicator.macd_fast must be smaller than indicator.macd_slow".to_string(),
            ));
        }
        Ok(())
    }
}

/// # Summary
/// 信号识别阈值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    // 均线信号的快线周期
    pub ma_fast: usize,
    // 均线信号的慢线周期
    pub ma_slow: usize,
    // RSI 信号使用的周期
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub rsi_midline: f64,
    // KDJ 金叉低位区上界
    pub kdj_low: f64,
    // KDJ 死叉高位区下界
    pub kdj_high: f64,
    pub j_overbought: f64,
    pub j_oversold: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            ma_fast: 5,
            ma_slow: 20,
            rsi_period: 6,
            rsi_overbought: 80.0,
            rsi_oversold: 20.0,
            rsi_midline: 50.0,
            kdj_low: 20.0,
            kdj_high: 80.0,
            j_overbought: 100.0,
            j_oversold: 0.0,
        }
    }
}

/// # Summary
/// 综合评分的维度权重，单位为整数百分比。
///
/// # Invariants
/// - 默认权重之和为 100；缺失维度不做重新归一化。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub valuation: i32,
    pub growth: i32,
    pub fund_flow: i32,
    pub technical: i32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            valuation: 30,
            growth: 30,
            fund_flow: 20,
            technical: 20,
        }
    }
}

impl ScoreWeights {
    pub fn weight(&self, dimension: Dimension) -> i32 {
        match dimension {
            Dimension::Valuation => self.valuation,
            Dimension::Growth => self.growth,
            Dimension::FundFlow => self.fund_flow,
            Dimension::Technical => self.technical,
        }
    }
}

/// 缓存后端类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Sqlite,
    Disabled,
}

/// # Summary
/// 缓存配置，过期时间按数据类别区分 (秒)。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    // SQLite 数据库文件路径
    pub path: PathBuf,
    pub realtime_ttl_secs: u64,
    pub daily_kline_ttl_secs: u64,
    pub financial_ttl_secs: u64,
    pub valuation_ttl_secs: u64,
    pub fund_flow_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            path: PathBuf::from(".cache/kabu_cache.db"),
            realtime_ttl_secs: 60,
            daily_kline_ttl_secs: 3600,
            financial_ttl_secs: 86400 * 7,
            valuation_ttl_secs: 3600,
            fund_flow_ttl_secs: 3600,
        }
    }
}

impl CacheConfig {
    pub fn realtime_ttl(&self) -> Duration {
        Duration::from_secs(self.realtime_ttl_secs)
    }

    pub fn daily_kline_ttl(&self) -> Duration {
        Duration::from_secs(self.daily_kline_ttl_secs)
    }

    pub fn financial_ttl(&self) -> Duration {
        Duration::from_secs(self.financial_ttl_secs)
    }

    pub fn valuation_ttl(&self) -> Duration {
        Duration::from_secs(self.valuation_ttl_secs)
    }

    pub fn fund_flow_ttl(&self) -> Duration {
        Duration::from_secs(self.fund_flow_ttl_secs)
    }
}

/// 行情数据源配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    // 实时行情接口地址
    pub quote_base_url: String,
    // 历史 K 线与资金流向接口地址
    pub history_base_url: String,
    // 财务主要指标 (F10) 接口地址
    pub datacenter_base_url: String,
    // 雪球行情详情接口地址
    pub xueqiu_base_url: String,
    // 雪球首页，未配置令牌时从此处获取 `xq_a_token`
    pub xueqiu_home_url: String,
    pub xueqiu_token: Option<String>,
    pub timeout_secs: u64,
    // 设置后改用本地 JSON 数据源
    pub fixture_dir: Option<PathBuf>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            quote_base_url: "https://push2.eastmoney.com".to_string(),
            history_base_url: "https://push2his.eastmoney.com".to_string(),
            datacenter_base_url: "https://datacenter.eastmoney.com".to_string(),
            xueqiu_base_url: "https://stock.xueqiu.com".to_string(),
            xueqiu_home_url: "https://xueqiu.com".to_string(),
            xueqiu_token: None,
            timeout_secs: 10,
            fixture_dir: None,
        }
    }
}

/// 日志配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    // 默认过滤级别，`RUST_LOG` 优先
    pub level: String,
    // 设置后额外按日滚动写入该目录
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

impl AppConfig {
    /// # Summary
    /// 加载应用配置。
    ///
    /// # Logic
    /// 1. 以内置默认值作为最底层配置源。
    /// 2. 若提供了配置文件路径，叠加该文件 (格式按扩展名识别)。
    /// 3. 叠加 `KABU__` 前缀的环境变量，段之间以 `__` 分隔，例如 `KABU__CACHE__BACKEND=sqlite`。
    /// 4. 反序列化并校验指标参数。
    ///
    /// # Arguments
    /// * `path`: 可选的配置文件路径。
    ///
    /// # Returns
    /// 成功返回配置；任一来源解析失败返回 `ConfigError`。
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&AppConfig::default())?);
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("KABU")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let app: AppConfig = settings.try_deserialize()?;
        app.analysis.validate()?;
        app.indicator.validate()?;
        debug!(
            file = ?path,
            backend = ?app.cache.backend,
            fixture = app.feed.fixture_dir.is_some(),
            "Configuration loaded"
        );
        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.analysis.history_days, 365);
        assert_eq!(config.analysis.min_technical_bars, 61);
        assert_eq!(config.analysis.dimensions.len(), 4);
        assert_eq!(config.indicator.ma_periods, vec![5, 10, 20, 60]);
        assert_eq!(config.signal.rsi_period, 6);
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.cache.financial_ttl(), Duration::from_secs(604800));
        assert_eq!(config.feed.timeout_secs, 10);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_default_weights_sum_to_hundred() {
        let w = ScoreWeights::default();
        let sum: i32 = Dimension::ALL.iter().map(|d| w.weight(*d)).sum();
        assert_eq!(sum, 100);
    }

    #[test]
    fn test_load_overrides_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "[analysis]\nhistory_days = 200\n\n[cache]\nbackend = \"sqlite\"\n\n[weights]\ntechnical = 40"
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.analysis.history_days, 200);
        assert_eq!(config.analysis.fund_flow_window, 10);
        assert_eq!(config.cache.backend, CacheBackend::Sqlite);
        assert_eq!(config.weights.technical, 40);
        assert_eq!(config.weights.valuation, 30);
    }

    #[test]
    fn test_invalid_indicator_periods_rejected() {
        let mut indicator = IndicatorConfig::default();
        indicator.macd_fast = 30;
        assert!(matches!(indicator.validate(), Err(ConfigError::Invalid(_))));

        let mut indicator = IndicatorConfig::default();
        indicator.boll_period = 0;
        assert!(matches!(indicator.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_invalid_analysis_bounds_rejected() {
        assert!(AnalysisConfig::default().validate().is_ok());

        for days in [0, -5, MAX_HISTORY_DAYS + 1, i64::MAX] {
            let analysis = AnalysisConfig {
                history_days: days,
                ..AnalysisConfig::default()
            };
            assert!(matches!(analysis.validate(), Err(ConfigError::Invalid(_))), "{}", days);
        }

        let analysis = AnalysisConfig {
            fund_flow_window: 0,
            ..AnalysisConfig::default()
        };
        assert!(matches!(analysis.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_rejects_out_of_range_history() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(file, "[analysis]\nhistory_days = 9223372036854775807").unwrap();

        assert!(matches!(
            AppConfig::load(Some(file.path())),
            Err(ConfigError::Invalid(_))
        ));
    }
}
