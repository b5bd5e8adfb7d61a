use chrono::NaiveDate;
use kabu_core::config::SignalConfig;
use kabu_core::market::entity::PriceBar;
use kabu_technical::signal::{
    Bias, BollSignal, KdjSignal, MaSignal, MacdSignal, RsiSignal, Signal, SignalDetector,
    SignalFamily,
};
use kabu_technical::IndicatorRow;
use std::collections::BTreeMap;

/// 构造一行全部未定义的指标，仅保留收盘价
fn blank_row(day: u32, close: f64) -> IndicatorRow {
    IndicatorRow {
        bar: PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000.0,
        },
        ma: BTreeMap::new(),
        dif: None,
        dea: None,
        macd: None,
        rsi: BTreeMap::new(),
        k: None,
        d: None,
        j: None,
        boll_mid: None,
        boll_up: None,
        boll_down: None,
        volume_ratio: None,
    }
}

fn with_ma(mut row: IndicatorRow, ma5: f64, ma20: f64) -> IndicatorRow {
    row.ma.insert(5, Some(ma5));
    row.ma.insert(20, Some(ma20));
    row
}

fn with_kdj(mut row: IndicatorRow, k: f64, d: f64) -> IndicatorRow {
    row.k = Some(k);
    row.d = Some(d);
    row.j = Some(3.0 * k - 2.0 * d);
    row
}

fn detector() -> SignalDetector {
    SignalDetector::new(SignalConfig::default())
}

#[test]
fn test_empty_rows_yield_empty_set() {
    assert!(detector().detect(&[]).is_empty());
}

#[test]
fn test_undefined_families_are_skipped() {
    let set = detector().detect(&[blank_row(1, 10.0), blank_row(2, 10.0)]);
    assert!(set.is_empty());
}

#[test]
fn test_ma_golden_cross_and_alignment() {
    let prev = with_ma(blank_row(1, 10.0), 9.8, 10.0);
    let latest = with_ma(blank_row(2, 10.5), 10.2, 10.0);
    let set = detector().detect(&[prev, latest.clone()]);
    assert_eq!(
        set.get(SignalFamily::Ma),
        Some(&Signal::Ma(MaSignal::GoldenCross { fast: 5, slow: 20 }))
    );

    // 前一行已在上方：不再是金叉，收盘 > MA5 > MA20 为多头排列
    let prev = with_ma(blank_row(1, 10.0), 10.1, 10.0);
    let set = detector().detect(&[prev, latest]);
    assert_eq!(
        set.get(SignalFamily::Ma),
        Some(&Signal::Ma(MaSignal::BullishAlignment))
    );

    // 只有一行时前一行即最新行，无法构成穿越
    let only = with_ma(blank_row(2, 9.0), 9.5, 10.0);
    let set = detector().detect(&[only]);
    assert_eq!(
        set.get(SignalFamily::Ma),
        Some(&Signal::Ma(MaSignal::BearishAlignment))
    );
}

#[test]
fn test_ma_death_cross() {
    // MA5 从上方 10.2 跌到 9.8，下穿 MA20 = 10.0
    let prev = with_ma(blank_row(1, 10.3), 10.2, 10.0);
    let latest = with_ma(blank_row(2, 9.5), 9.8, 10.0);
    let set = detector().detect(&[prev, latest]);
    let signal = set.get(SignalFamily::Ma).copied();
    assert_eq!(
        signal,
        Some(Signal::Ma(MaSignal::DeathCross { fast: 5, slow: 20 }))
    );
    assert_eq!(signal.map(|s| s.bias()), Some(Bias::Bearish));
    assert_eq!(
        signal.map(|s| s.labeled()).as_deref(),
        Some("🔴 死叉（MA5下穿MA20）")
    );
}

#[test]
fn test_ma_range_when_close_between_lines() {
    let prev = with_ma(blank_row(1, 10.0), 10.3, 10.0);
    let latest = with_ma(blank_row(2, 10.1), 10.3, 10.0);
    let set = detector().detect(&[prev, latest]);
    let signal = set.get(SignalFamily::Ma).copied();
    assert_eq!(signal, Some(Signal::Ma(MaSignal::Range)));
    assert_eq!(signal.map(|s| s.bias()), Some(Bias::Neutral));
}

#[test]
fn test_macd_cross_then_histogram() {
    let mut prev = blank_row(1, 10.0);
    prev.dif = Some(-0.1);
    prev.dea = Some(0.0);
    let mut latest = blank_row(2, 10.0);
    latest.dif = Some(0.1);
    latest.dea = Some(0.0);
    latest.macd = Some(0.2);
    let set = detector().detect(&[prev.clone(), latest.clone()]);
    assert_eq!(set.get(SignalFamily::Macd), Some(&Signal::Macd(MacdSignal::GoldenCross)));

    prev.dif = Some(0.05);
    let set = detector().detect(&[prev, latest]);
    assert_eq!(set.get(SignalFamily::Macd), Some(&Signal::Macd(MacdSignal::Bullish)));
}

#[test]
fn test_macd_death_cross_then_bearish_histogram() {
    let mut prev = blank_row(1, 10.0);
    prev.dif = Some(0.1);
    prev.dea = Some(0.0);
    let mut latest = blank_row(2, 10.0);
    latest.dif = Some(-0.1);
    latest.dea = Some(0.0);
    latest.macd = Some(-0.2);
    let set = detector().detect(&[prev.clone(), latest.clone()]);
    assert_eq!(set.get(SignalFamily::Macd), Some(&Signal::Macd(MacdSignal::DeathCross)));

    // 没有穿越时按柱状值判定，柱 ≤ 0 为空头
    prev.dif = Some(-0.05);
    let set = detector().detect(&[prev.clone(), latest.clone()]);
    assert_eq!(set.get(SignalFamily::Macd), Some(&Signal::Macd(MacdSignal::Bearish)));

    latest.macd = Some(0.0);
    let set = detector().detect(&[prev, latest]);
    let signal = set.get(SignalFamily::Macd).copied();
    assert_eq!(signal, Some(Signal::Macd(MacdSignal::Bearish)));
    assert_eq!(signal.map(|s| s.bias()), Some(Bias::Bearish));
}

#[test]
fn test_rsi_thresholds() {
    let cases = [
        (85.0, RsiSignal::Overbought(85.0)),
        (15.0, RsiSignal::Oversold(15.0)),
        (60.0, RsiSignal::Strong(60.0)),
        (50.0, RsiSignal::Weak(50.0)),
    ];
    for (value, expected) in cases {
        let mut row = blank_row(1, 10.0);
        row.rsi.insert(6, Some(value));
        let set = detector().detect(&[row]);
        assert_eq!(set.get(SignalFamily::Rsi), Some(&Signal::Rsi(expected)));
    }
}

#[test]
fn test_kdj_low_golden_cross() {
    // 前一行 K=15 D=22，最新 K=25 D=20
    let prev = with_kdj(blank_row(1, 10.0), 15.0, 22.0);
    let latest = with_kdj(blank_row(2, 10.0), 25.0, 20.0);
    let set = detector().detect(&[prev, latest]);
    let signal = set.get(SignalFamily::Kdj).copied();
    assert_eq!(signal, Some(Signal::Kdj(KdjSignal::LowGoldenCross)));
    assert_eq!(signal.map(|s| s.bias()), Some(Bias::Bullish));
}

#[test]
fn test_kdj_cross_outside_zone_falls_back_to_j() {
    // 中位金叉不计为低位金叉；J = 3×55 − 2×45 = 75，中性
    let prev = with_kdj(blank_row(1, 10.0), 40.0, 45.0);
    let latest = with_kdj(blank_row(2, 10.0), 55.0, 45.0);
    let set = detector().detect(&[prev, latest]);
    assert_eq!(set.get(SignalFamily::Kdj), Some(&Signal::Kdj(KdjSignal::Neutral)));

    // 高位死叉
    let prev = with_kdj(blank_row(1, 10.0), 90.0, 85.0);
    let latest = with_kdj(blank_row(2, 10.0), 84.0, 86.0);
    let set = detector().detect(&[prev, latest]);
    assert_eq!(set.get(SignalFamily::Kdj), Some(&Signal::Kdj(KdjSignal::HighDeathCross)));

    // J > 100 超买
    let row = with_kdj(blank_row(1, 10.0), 95.0, 80.0);
    let set = detector().detect(&[row]);
    assert_eq!(
        set.get(SignalFamily::Kdj),
        Some(&Signal::Kdj(KdjSignal::Overbought { j: 125.0 }))
    );
}

#[test]
fn test_kdj_negative_j_is_oversold() {
    // J = 3×10 − 2×20 = −10 < 0
    let prev = with_kdj(blank_row(1, 10.0), 12.0, 21.0);
    let latest = with_kdj(blank_row(2, 10.0), 10.0, 20.0);
    let set = detector().detect(&[prev, latest]);
    let signal = set.get(SignalFamily::Kdj).copied();
    assert_eq!(signal, Some(Signal::Kdj(KdjSignal::Oversold { j: -10.0 })));
    assert_eq!(signal.map(|s| s.bias()), Some(Bias::Bullish));
}

#[test]
fn test_boll_zero_mid_still_in_channel() {
    let mut row = blank_row(1, 0.0);
    row.boll_mid = Some(0.0);
    row.boll_up = Some(0.5);
    row.boll_down = Some(-0.5);
    let set = detector().detect(&[row]);
    let signal = set.get(SignalFamily::Boll).copied();
    assert_eq!(signal, Some(Signal::Boll(BollSignal::InChannel { width_pct: None })));
    assert_eq!(signal.map(|s| s.labeled()).as_deref(), Some("⚪ 通道内"));
}

#[test]
fn test_boll_breaches_and_channel_width() {
    let mut row = blank_row(1, 12.0);
    row.boll_mid = Some(10.0);
    row.boll_up = Some(11.0);
    row.boll_down = Some(9.0);
    let set = detector().detect(&[row.clone()]);
    assert_eq!(set.get(SignalFamily::Boll), Some(&Signal::Boll(BollSignal::UpperBreach)));

    row.bar.close = 8.0;
    let set = detector().detect(&[row.clone()]);
    assert_eq!(set.get(SignalFamily::Boll), Some(&Signal::Boll(BollSignal::LowerBreach)));

    row.bar.close = 10.0;
    let set = detector().detect(&[row]);
    let description = set.get(SignalFamily::Boll).map(|s| s.description());
    assert_eq!(description.as_deref(), Some("通道内 (带宽20.0%)"));
}

#[test]
fn test_signal_set_order() {
    let mut row = with_kdj(with_ma(blank_row(1, 10.0), 10.0, 10.0), 50.0, 50.0);
    row.dif = Some(0.1);
    row.dea = Some(0.2);
    row.macd = Some(-0.2);
    row.rsi.insert(6, Some(45.0));
    row.boll_mid = Some(10.0);
    row.boll_up = Some(11.0);
    row.boll_down = Some(9.0);
    let set = detector().detect(&[row]);
    let families: Vec<SignalFamily> = set.iter().map(|s| s.family()).collect();
    assert_eq!(families, SignalFamily::ALL.to_vec());
}
