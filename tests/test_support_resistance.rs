use razgon_bot::trading::analysis::market_analyzer::{
    LevelKind, MarketAnalyzer, TrendDirection,
};
use razgon_bot::trading::indicator::indicator_combine::IndicatorCombine;
use razgon_bot::CandleItem;

fn candle(ts: i64, close: f64) -> CandleItem {
    CandleItem::builder()
        .ts(ts)
        .o(close)
        .h(close + 0.0002)
        .l(close - 0.0002)
        .c(close)
        .v(100.0)
        .build()
        .unwrap()
}

/// 帐篷形走势：峰在20，谷在40
fn tent_candles() -> Vec<CandleItem> {
    let mut candles = Vec::new();
    for i in 0..60i64 {
        let close = if i <= 20 {
            1.1000 + 0.0010 * i as f64
        } else if i <= 40 {
            1.1200 - 0.0012 * (i - 20) as f64
        } else {
            1.0960 + 0.0008 * (i - 40) as f64
        };
        candles.push(candle(i * 60_000, close));
    }
    candles
}

#[test]
fn test_pivot_levels_detected() {
    let candles = tent_candles();
    let levels = MarketAnalyzer::find_levels(&candles, 10);

    let resistances: Vec<_> = candles
        .iter()
        .map(|c| c.h())
        .collect();
    let peak_high = resistances[20];
    let valley_low = candles[40].l();

    assert!(levels
        .iter()
        .any(|lvl| lvl.kind == LevelKind::Resistance && (lvl.price - peak_high).abs() < 1e-9));
    assert!(levels
        .iter()
        .any(|lvl| lvl.kind == LevelKind::Support && (lvl.price - valley_low).abs() < 1e-9));
}

#[test]
fn test_no_levels_on_short_series() {
    let candles: Vec<CandleItem> = (0..15i64).map(|i| candle(i * 60_000, 1.1)).collect();
    assert!(MarketAnalyzer::find_levels(&candles, 10).is_empty());
}

#[test]
fn test_nearest_level_picks_closest() {
    let candles = tent_candles();
    let levels = MarketAnalyzer::find_levels(&candles, 10);
    let (level, dist) = MarketAnalyzer::nearest_level(&levels, 1.1190).unwrap();
    assert_eq!(level.kind, LevelKind::Resistance);
    assert!(dist < 0.0020);
}

#[test]
fn test_uptrend_label_on_rising_series() {
    let mut candles = Vec::new();
    let mut close = 1.1000;
    for i in 0..120i64 {
        close += 0.0004;
        candles.push(candle(i * 60_000, close));
    }
    let frames = IndicatorCombine::calculate_frames(&candles, 9, 21, 14, 14).unwrap();
    assert_eq!(MarketAnalyzer::identify_trend(&frames), TrendDirection::Up);
}

#[test]
fn test_downtrend_label_on_falling_series() {
    let mut candles = Vec::new();
    let mut close = 1.3000;
    for i in 0..120i64 {
        close -= 0.0004;
        candles.push(candle(i * 60_000, close));
    }
    let frames = IndicatorCombine::calculate_frames(&candles, 9, 21, 14, 14).unwrap();
    assert_eq!(MarketAnalyzer::identify_trend(&frames), TrendDirection::Down);
}

#[test]
fn test_unknown_trend_without_enough_ready_bars() {
    let candles: Vec<CandleItem> = (0..40i64)
        .map(|i| candle(i * 60_000, 1.1 + 0.0004 * i as f64))
        .collect();
    // 40根K线里只有20根过了预热期，不足50根
    let frames = IndicatorCombine::calculate_frames(&candles, 9, 21, 14, 14).unwrap();
    assert_eq!(
        MarketAnalyzer::identify_trend(&frames),
        TrendDirection::Unknown
    );
}
