//! # kabu-technical
//!
//! 技术面计算：在只读日线序列上计算 MA / MACD / RSI / KDJ / BOLL / 量比，
//! 并根据最近两行指标识别各指标族的信号。全部为纯函数，不做任何 I/O。

pub mod indicator;
pub mod signal;

pub use indicator::{IndicatorEngine, IndicatorRow};
pub use signal::{Bias, Signal, SignalDetector, SignalFamily, SignalSet};
