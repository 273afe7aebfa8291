use razgon_bot::trading::indicator::indicator_combine::IndicatorCombine;
use razgon_bot::error::app_error::AppError;
use razgon_bot::CandleItem;

fn rising_candles(count: usize) -> Vec<CandleItem> {
    let mut candles = Vec::with_capacity(count);
    let mut close = 1.1000;
    for i in 0..count {
        let open = close;
        close += 0.0005;
        candles.push(
            CandleItem::builder()
                .ts(i as i64 * 60_000)
                .o(open)
                .h(close + 0.0002)
                .l(open - 0.0002)
                .c(close)
                .v(100.0)
                .build()
                .unwrap(),
        );
    }
    candles
}

#[test]
fn test_fast_ema_above_slow_in_uptrend() {
    // 持续上涨时快线必然在慢线上方
    let candles = rising_candles(100);
    let frames = IndicatorCombine::calculate_frames(&candles, 9, 21, 14, 14).unwrap();
    assert_eq!(frames.len(), candles.len());

    let last = frames.last().unwrap();
    assert!(last.is_ready);
    assert!(
        last.ema_fast > last.ema_slow,
        "fast {} should exceed slow {}",
        last.ema_fast,
        last.ema_slow
    );
}

#[test]
fn test_warmup_rows_marked_not_ready() {
    let candles = rising_candles(40);
    let frames = IndicatorCombine::calculate_frames(&candles, 9, 21, 14, 14).unwrap();
    // 最长周期是21，前20行不可用
    for frame in frames.iter().take(20) {
        assert!(!frame.is_ready);
    }
    assert!(frames[20].is_ready);
}

#[test]
fn test_insufficient_history_is_an_error() {
    let candles = rising_candles(10);
    let result = IndicatorCombine::calculate_frames(&candles, 9, 21, 14, 14);
    match result {
        Err(AppError::InsufficientHistory { required, got }) => {
            assert_eq!(required, 21);
            assert_eq!(got, 10);
        }
        other => panic!("expected InsufficientHistory, got {:?}", other.map(|f| f.len())),
    }
}
