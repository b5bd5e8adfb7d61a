use serde::{Deserialize, Serialize};
use std::fmt;

/// # Summary
/// 指标族，决定信号集合中的评估顺序。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SignalFamily {
    Ma,
    Macd,
    Rsi,
    Kdj,
    Boll,
}

impl SignalFamily {
    pub const ALL: [SignalFamily; 5] = [
        SignalFamily::Ma,
        SignalFamily::Macd,
        SignalFamily::Rsi,
        SignalFamily::Kdj,
        SignalFamily::Boll,
    ];
}

impl fmt::Display for SignalFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalFamily::Ma => write!(f, "MA"),
            SignalFamily::Macd => write!(f, "MACD"),
            SignalFamily::Rsi => write!(f, "RSI"),
            SignalFamily::Kdj => write!(f, "KDJ"),
            SignalFamily::Boll => write!(f, "BOLL"),
        }
    }
}

/// 信号倾向。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

impl Bias {
    /// 报告中使用的倾向标记。
    pub fn marker(&self) -> &'static str {
        match self {
            Bias::Bullish => "🟢",
            Bias::Bearish => "🔴",
            Bias::Neutral => "⚪",
        }
    }

    /// 技术面评分的加减分。
    pub fn score_delta(&self) -> i32 {
        match self {
            Bias::Bullish => 5,
            Bias::Bearish => -5,
            Bias::Neutral => 0,
        }
    }
}

/// 均线信号。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaSignal {
    GoldenCross { fast: usize, slow: usize },
    DeathCross { fast: usize, slow: usize },
    BullishAlignment,
    BearishAlignment,
    Range,
}

/// MACD 信号。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MacdSignal {
    GoldenCross,
    DeathCross,
    Bullish,
    Bearish,
}

/// RSI 信号，携带最新 RSI 值。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RsiSignal {
    Overbought(f64),
    Oversold(f64),
    Strong(f64),
    Weak(f64),
}

/// KDJ 信号。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum KdjSignal {
    LowGoldenCross,
    HighDeathCross,
    Overbought { j: f64 },
    Oversold { j: f64 },
    Neutral,
}

/// 布林带信号。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BollSignal {
    UpperBreach,
    LowerBreach,
    // 中轨为 0 时带宽未定义
    InChannel { width_pct: Option<f64> },
}

/// # Summary
/// 单个指标族识别出的信号。
///
/// # Invariants
/// - 每个变体只属于一个指标族，`family()` 与变体一一对应。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", content = "value")]
pub enum Signal {
    Ma(MaSignal),
    Macd(MacdSignal),
    Rsi(RsiSignal),
    Kdj(KdjSignal),
    Boll(BollSignal),
}

impl Signal {
    pub fn family(&self) -> SignalFamily {
        match self {
            Signal::Ma(_) => SignalFamily::Ma,
            Signal::Macd(_) => SignalFamily::Macd,
            Signal::Rsi(_) => SignalFamily::Rsi,
            Signal::Kdj(_) => SignalFamily::Kdj,
            Signal::Boll(_) => SignalFamily::Boll,
        }
    }

    /// # Summary
    /// 信号倾向。
    ///
    /// # Logic
    /// 金叉、多头、超卖、偏强、跌破下轨偏多；死叉、空头、超买、偏弱、突破上轨偏空；其余中性。
    pub fn bias(&self) -> Bias {
        match self {
            Signal::Ma(MaSignal::GoldenCross { .. } | MaSignal::BullishAlignment) => Bias::Bullish,
            Signal::Ma(MaSignal::DeathCross { .. } | MaSignal::BearishAlignment) => Bias::Bearish,
            Signal::Ma(MaSignal::Range) => Bias::Neutral,
            Signal::Macd(MacdSignal::GoldenCross | MacdSignal::Bullish) => Bias::Bullish,
            Signal::Macd(MacdSignal::DeathCross | MacdSignal::Bearish) => Bias::Bearish,
            Signal::Rsi(RsiSignal::Oversold(_) | RsiSignal::Strong(_)) => Bias::Bullish,
            Signal::Rsi(RsiSignal::Overbought(_) | RsiSignal::Weak(_)) => Bias::Bearish,
            Signal::Kdj(KdjSignal::LowGoldenCross | KdjSignal::Oversold { .. }) => Bias::Bullish,
            Signal::Kdj(KdjSignal::HighDeathCross | KdjSignal::Overbought { .. }) => Bias::Bearish,
            Signal::Kdj(KdjSignal::Neutral) => Bias::Neutral,
            Signal::Boll(BollSignal::LowerBreach) => Bias::Bullish,
            Signal::Boll(BollSignal::UpperBreach) => Bias::Bearish,
            Signal::Boll(BollSignal::InChannel { .. }) => Bias::Neutral,
        }
    }

    /// 不带倾向标记的中文描述。
    pub fn description(&self) -> String {
        match self {
            Signal::Ma(MaSignal::GoldenCross { fast, slow }) => {
                format!("金叉（MA{}上穿MA{}）", fast, slow)
            }
            Signal::Ma(MaSignal::DeathCross { fast, slow }) => {
                format!("死叉（MA{}下穿MA{}）", fast, slow)
            }
            Signal::Ma(MaSignal::BullishAlignment) => "多头排列".to_string(),
            Signal::Ma(MaSignal::BearishAlignment) => "空头排列".to_string(),
            Signal::Ma(MaSignal::Range) => "震荡".to_string(),
            Signal::Macd(MacdSignal::GoldenCross) => "金叉".to_string(),
            Signal::Macd(MacdSignal::DeathCross) => "死叉".to_string(),
            Signal::Macd(MacdSignal::Bullish) => "多头".to_string(),
            Signal::Macd(MacdSignal::Bearish) => "空头".to_string(),
            Signal::Rsi(RsiSignal::Overbought(v)) => format!("超买 ({:.1})", v),
            Signal::Rsi(RsiSignal::Oversold(v)) => format!("超卖 ({:.1})", v),
            Signal::Rsi(RsiSignal::Strong(v)) => format!("偏强 ({:.1})", v),
            Signal::Rsi(RsiSignal::Weak(v)) => format!("偏弱 ({:.1})", v),
            Signal::Kdj(KdjSignal::LowGoldenCross) => "低位金叉".to_string(),
            Signal::Kdj(KdjSignal::HighDeathCross) => "高位死叉".to_string(),
            Signal::Kdj(KdjSignal::Overbought { j }) => format!("超买 (J={:.1})", j),
            Signal::Kdj(KdjSignal::Oversold { j }) => format!("超卖 (J={:.1})", j),
            Signal::Kdj(KdjSignal::Neutral) => "中性".to_string(),
            Signal::Boll(BollSignal::UpperBreach) => "突破上轨（注意回调）".to_string(),
            Signal::Boll(BollSignal::LowerBreach) => "突破下轨（注意反弹）".to_string(),
            Signal::Boll(BollSignal::InChannel {
                width_pct: Some(width),
            }) => format!("通道内 (带宽{:.1}%)", width),
            Signal::Boll(BollSignal::InChannel { width_pct: None }) => "通道内".to_string(),
        }
    }

    /// 带倾向标记的描述，例如 `🟢 金叉`。
    pub fn labeled(&self) -> String {
        format!("{} {}", self.bias().marker(), self.description())
    }
}

/// # Summary
/// 一次识别得到的信号集合。
///
/// # Invariants
/// - 每个指标族至多一个信号，按 MA、MACD、RSI、KDJ、BOLL 顺序排列。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalSet {
    signals: Vec<Signal>,
}

impl SignalSet {
    /// # Summary
    /// 由任意顺序的信号构造集合。
    ///
    /// # Logic
    /// 按指标族排序，同族重复时保留先出现的一个。
    pub fn new(mut signals: Vec<Signal>) -> Self {
        signals.sort_by_key(|s| s.family());
        signals.dedup_by_key(|s| s.family());
        Self { signals }
    }

    pub fn get(&self, family: SignalFamily) -> Option<&Signal> {
        self.signals.iter().find(|s| s.family() == family)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter()
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}
