use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// # Summary
/// 证券所属交易所。
///
/// # Invariants
/// - 由 6 位 A 股代码首位推导：`6` 为上交所，`0`/`3` 为深交所，`4`/`8` 为北交所，其余按深交所处理。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    // 上海证券交易所
    Sh,
    // 深圳证券交易所
    Sz,
    // 北京证券交易所
    Bj,
}

impl Exchange {
    /// 根据证券代码首位推导交易所。
    pub fn from_code(code: &str) -> Self {
        match code.trim().chars().next() {
            Some('6') => Exchange::Sh,
            Some('0' | '3') => Exchange::Sz,
            Some('4' | '8') => Exchange::Bj,
            _ => Exchange::Sz,
        }
    }

    /// 带交易所前缀的大写标识，例如 `SH`。
    pub fn prefix(&self) -> &'static str {
        match self {
            Exchange::Sh => "SH",
            Exchange::Sz => "SZ",
            Exchange::Bj => "BJ",
        }
    }

    /// 资金流向等接口使用的小写市场标识。
    pub fn market(&self) -> &'static str {
        match self {
            Exchange::Sh => "sh",
            Exchange::Sz => "sz",
            Exchange::Bj => "bj",
        }
    }
}

/// # Summary
/// 证券标的实体，代表一次分析所针对的单只股票。
///
/// # Invariants
/// - `symbol` 为去除首尾空白后的纯数字代码 (例如: 002475)。
/// - `exchange` 总是与 `symbol` 一致，由 [`Stock::from_code`] 推导。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stock {
    // 股票代码 (例如: 600519, 002475)
    pub symbol: String,
    // 交易所
    pub exchange: Exchange,
}

impl Stock {
    /// # Summary
    /// 由纯数字代码构造证券身份。
    ///
    /// # Logic
    /// 1. 去除首尾空白。
    /// 2. 根据首位字符推导交易所。
    ///
    /// # Arguments
    /// * `code`: 证券代码。
    ///
    /// # Returns
    /// 证券身份实体。
    pub fn from_code(code: &str) -> Self {
        let symbol = code.trim().to_string();
        let exchange = Exchange::from_code(&symbol);
        Self { symbol, exchange }
    }

    /// 带交易所前缀的代码，例如 `SZ002475`。
    pub fn prefixed(&self) -> String {
        format!("{}{}", self.exchange.prefix(), self.symbol)
    }

    /// 资金流向接口使用的市场标识。
    pub fn market(&self) -> &'static str {
        self.exchange.market()
    }
}

impl std::fmt::Display for Stock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// # Summary
/// 日线行情的复权方式。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Adjustment {
    // 不复权
    None,
    // 前复权
    #[default]
    Qfq,
    // 后复权
    Hfq,
}

impl FromStr for Adjustment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "" | "none" => Ok(Adjustment::None),
            "qfq" => Ok(Adjustment::Qfq),
            "hfq" => Ok(Adjustment::Hfq),
            _ => Err(format!("Unknown Adjustment: {}", s)),
        }
    }
}

impl std::fmt::Display for Adjustment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Adjustment::None => write!(f, "none"),
            Adjustment::Qfq => write!(f, "qfq"),
            Adjustment::Hfq => write!(f, "hfq"),
        }
    }
}

/// # Summary
/// 综合评分的四个分析维度。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    // 估值
    Valuation,
    // 成长性
    Growth,
    // 资金面
    FundFlow,
    // 技术面
    Technical,
}

impl Dimension {
    /// 按报告展示顺序排列的全部维度。
    pub const ALL: [Dimension; 4] = [
        Dimension::Valuation,
        Dimension::Growth,
        Dimension::FundFlow,
        Dimension::Technical,
    ];

    /// 报告中使用的维度标题。
    pub fn title(&self) -> &'static str {
        match self {
            Dimension::Valuation => "估值分析",
            Dimension::Growth => "成长性分析",
            Dimension::FundFlow => "资金面分析",
            Dimension::Technical => "技术面分析",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dimension::Valuation => write!(f, "valuation"),
            Dimension::Growth => write!(f, "growth"),
            Dimension::FundFlow => write!(f, "fund_flow"),
            Dimension::Technical => write!(f, "technical"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_from_code() {
        assert_eq!(Exchange::from_code("600519"), Exchange::Sh);
        assert_eq!(Exchange::from_code("002475"), Exchange::Sz);
        assert_eq!(Exchange::from_code("300750"), Exchange::Sz);
        assert_eq!(Exchange::from_code("830799"), Exchange::Bj);
        assert_eq!(Exchange::from_code("430047"), Exchange::Bj);
        assert_eq!(Exchange::from_code("900901"), Exchange::Sz);
    }

    #[test]
    fn test_stock_prefix_and_market() {
        let stock = Stock::from_code(" 600519 ");
        assert_eq!(stock.symbol, "600519");
        assert_eq!(stock.prefixed(), "SH600519");
        assert_eq!(stock.market(), "sh");

        let stock = Stock::from_code("002475");
        assert_eq!(stock.prefixed(), "SZ002475");
        assert_eq!(stock.market(), "sz");
    }

    #[test]
    fn test_adjustment_parse() {
        assert_eq!("QFQ".parse::<Adjustment>(), Ok(Adjustment::Qfq));
        assert_eq!("".parse::<Adjustment>(), Ok(Adjustment::None));
        assert!("weekly".parse::<Adjustment>().is_err());
        assert_eq!(Adjustment::Hfq.to_string(), "hfq");
    }
}
