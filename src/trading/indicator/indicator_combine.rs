use ta::indicators::ExponentialMovingAverage;
use ta::Next;

use crate::error::app_error::AppError;
use crate::trading::indicator::atr::Atr;
use crate::trading::indicator::rsi::Rsi;
use crate::CandleItem;

/// 单根K线对应的指标值
#[derive(Debug, Clone, Copy)]
pub struct IndicatorFrame {
    pub ts: i64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub rsi: f64,
    pub atr: f64,
    /// 预热期内的值不可信，禁止用于信号判断
    pub is_ready: bool,
}

/// 指标组合计算器，按K线逐根推进
pub struct IndicatorCombine {
    ema_fast: ExponentialMovingAverage,
    ema_slow: ExponentialMovingAverage,
    rsi: Rsi,
    atr: Atr,
    warmup: usize,
    count: usize,
}

impl IndicatorCombine {
    pub fn new(
        ema_fast_period: usize,
        ema_slow_period: usize,
        rsi_period: usize,
        atr_period: usize,
    ) -> Self {
        let warmup = ema_fast_period
            .max(ema_slow_period)
            .max(rsi_period)
            .max(atr_period);
        Self {
            ema_fast: ExponentialMovingAverage::new(ema_fast_period)
                .expect("ema period must be > 0"),
            ema_slow: ExponentialMovingAverage::new(ema_slow_period)
                .expect("ema period must be > 0"),
            rsi: Rsi::new(rsi_period),
            atr: Atr::new(atr_period),
            warmup,
            count: 0,
        }
    }

    /// 最长周期，即预热所需的最小K线数量
    pub fn warmup(&self) -> usize {
        self.warmup
    }

    pub fn next(&mut self, candle: &CandleItem) -> IndicatorFrame {
        self.count += 1;
        let ema_fast = self.ema_fast.next(candle.c());
        let ema_slow = self.ema_slow.next(candle.c());
        let rsi = self.rsi.next(candle.c());
        let atr = self.atr.next(candle.h(), candle.l(), candle.c());
        IndicatorFrame {
            ts: candle.ts(),
            ema_fast,
            ema_slow,
            rsi,
            atr,
            is_ready: self.count >= self.warmup,
        }
    }

    /// 批量计算整段K线的指标序列，与输入一一对应
    pub fn calculate_frames(
        candles: &[CandleItem],
        ema_fast_period: usize,
        ema_slow_period: usize,
        rsi_period: usize,
        atr_period: usize,
    ) -> Result<Vec<IndicatorFrame>, AppError> {
        let mut combine = Self::new(ema_fast_period, ema_slow_period, rsi_period, atr_period);
        if candles.len() < combine.warmup {
            return Err(AppError::InsufficientHistory {
                required: combine.warmup,
                got: candles.len(),
            });
        }
        Ok(candles.iter().map(|c| combine.next(c)).collect())
    }
}
