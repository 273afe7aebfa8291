use serde::{Deserialize, Serialize};
use ta::indicators::ExponentialMovingAverage;
use ta::Next;
use tracing::{debug, info};

use crate::app_config::settings::AppConfig;
use crate::error::app_error::AppError;
use crate::trading::indicator::indicator_combine::IndicatorCombine;
use crate::trading::strategy::strategy_common::SignalResult;
use crate::CandleItem;

/// 高周期趋势过滤需要的最少K线数量
const MIN_HTF_BARS: usize = 50;
/// 止损距离换算为步长时的乘数（1 pip = 10 tick）
const PRICE_STEP_TICKS: f64 = 10.0;

/// 均线金叉策略参数
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RazgonStrategyConfig {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub rsi_period: usize,
    pub atr_period: usize,
    /// 止损的ATR倍率，波动大的品种需要更宽的止损
    pub sl_atr_multiplier: f64,
    /// 止盈与风险距离的比值
    pub tp_risk_ratio: f64,
    /// 价格偏离慢线超过该ATR倍数时放弃入场
    pub overextension_atr_mult: f64,
    pub rsi_buy_floor: f64,
    pub rsi_buy_ceiling: f64,
    pub rsi_sell_floor: f64,
    pub rsi_sell_ceiling: f64,
}

impl Default for RazgonStrategyConfig {
    fn default() -> Self {
        Self {
            ema_fast: 9,
            ema_slow: 21,
            rsi_period: 14,
            atr_period: 14,
            sl_atr_multiplier: 2.0,
            tp_risk_ratio: 0.7,
            overextension_atr_mult: 2.0,
            rsi_buy_floor: 50.0,
            rsi_buy_ceiling: 75.0,
            rsi_sell_floor: 25.0,
            rsi_sell_ceiling: 50.0,
        }
    }
}

impl RazgonStrategyConfig {
    /// 按品种生成参数，套用该品种的止损倍率
    pub fn for_symbol(config: &AppConfig, symbol: &str) -> Self {
        Self {
            ema_fast: config.ema_fast,
            ema_slow: config.ema_slow,
            rsi_period: config.rsi_period,
            atr_period: config.atr_period,
            sl_atr_multiplier: config.sl_multiplier(symbol),
            ..Default::default()
        }
    }
}

pub struct RazgonStrategy;

impl RazgonStrategy {
    /// 双周期共振入场：高周期定方向，低周期金叉择时
    ///
    /// 无信号是正常返回而不是错误；只有品种元数据非法时才返回错误。
    pub fn get_trade_signal(
        htf_candles: &[CandleItem],
        ltf_candles: &[CandleItem],
        tick_size: f64,
        cfg: &RazgonStrategyConfig,
    ) -> Result<SignalResult, AppError> {
        if !(tick_size.is_finite() && tick_size > 0.0) {
            return Err(AppError::DataUnavailable(format!(
                "invalid tick size: {}",
                tick_size
            )));
        }

        let last_price = ltf_candles.last().map(|c| c.c()).unwrap_or(0.0);
        let last_ts = ltf_candles.last().map(|c| c.ts()).unwrap_or(0);

        // 1. 高周期趋势过滤，只看最新一根的均线排列
        if htf_candles.len() < MIN_HTF_BARS {
            debug!("htf history too short: {}", htf_candles.len());
            return Ok(SignalResult::no_signal(last_price, last_ts));
        }
        let mut htf_ema_fast = ExponentialMovingAverage::new(cfg.ema_fast)
            .map_err(|e| AppError::Unknown(format!("bad ema period: {:?}", e)))?;
        let mut htf_ema_slow = ExponentialMovingAverage::new(cfg.ema_slow)
            .map_err(|e| AppError::Unknown(format!("bad ema period: {:?}", e)))?;
        let mut htf_fast_value = 0.0;
        let mut htf_slow_value = 0.0;
        for candle in htf_candles {
            htf_fast_value = htf_ema_fast.next(candle.c());
            htf_slow_value = htf_ema_slow.next(candle.c());
        }
        let htf_up = htf_fast_value > htf_slow_value;
        let htf_down = htf_fast_value < htf_slow_value;

        // 2. 低周期指标，预热不足时跳过本轮
        let frames = match IndicatorCombine::calculate_frames(
            ltf_candles,
            cfg.ema_fast,
            cfg.ema_slow,
            cfg.rsi_period,
            cfg.atr_period,
        ) {
            Ok(frames) => frames,
            Err(AppError::InsufficientHistory { required, got }) => {
                debug!("ltf history too short: required={}, got={}", required, got);
                return Ok(SignalResult::no_signal(last_price, last_ts));
            }
            Err(e) => return Err(e),
        };
        if frames.len() < 2 {
            return Ok(SignalResult::no_signal(last_price, last_ts));
        }

        let current = frames[frames.len() - 1];
        let prev = frames[frames.len() - 2];
        if !current.is_ready || !prev.is_ready {
            return Ok(SignalResult::no_signal(last_price, last_ts));
        }
        let current_candle = &ltf_candles[ltf_candles.len() - 1];
        let close = current_candle.c();

        // 3. 低周期方向一致性
        let ltf_up = close > current.ema_slow;
        let ltf_down = close < current.ema_slow;

        // 4. 金叉/死叉
        let cross_up = prev.ema_fast <= prev.ema_slow && current.ema_fast > current.ema_slow;
        let cross_down = prev.ema_fast >= prev.ema_slow && current.ema_fast < current.ema_slow;

        // 5. 趋势强度：均线间距必须在扩大
        let curr_gap = (current.ema_fast - current.ema_slow).abs();
        let prev_gap = (prev.ema_fast - prev.ema_slow).abs();
        let is_trending_strong = curr_gap > prev_gap;

        // 6. 过度延伸：价格离慢线太远时不追
        let atr = current.atr;
        let dist_from_ema = (close - current.ema_slow).abs();
        let is_overextended = dist_from_ema > cfg.overextension_atr_mult * atr;

        // 7. K线形态确认
        let is_bullish_candle = current_candle.is_bullish();
        let is_bearish_candle = current_candle.is_bearish();

        let mut signal = SignalResult::no_signal(close, current.ts);

        // BUY优先判断，单次评估最多产生一个方向
        if htf_up
            && ltf_up
            && cross_up
            && is_trending_strong
            && !is_overextended
            && is_bullish_candle
            && current.rsi > cfg.rsi_buy_floor
            && current.rsi < cfg.rsi_buy_ceiling
        {
            let sl_price = current_candle.l() - cfg.sl_atr_multiplier * atr;
            let risk_dist = close - sl_price;
            signal.should_buy = true;
            signal.stop_loss = sl_price;
            signal.take_profit = close + risk_dist * cfg.tp_risk_ratio;
        } else if htf_down
            && ltf_down
            && cross_down
            && is_trending_strong
            && !is_overextended
            && is_bearish_candle
            && current.rsi < cfg.rsi_sell_ceiling
            && current.rsi > cfg.rsi_sell_floor
        {
            let sl_price = current_candle.h() + cfg.sl_atr_multiplier * atr;
            let risk_dist = sl_price - close;
            signal.should_sell = true;
            signal.stop_loss = sl_price;
            signal.take_profit = close - risk_dist * cfg.tp_risk_ratio;
        }

        if signal.has_signal() {
            signal.sl_steps = (close - signal.stop_loss).abs() / (tick_size * PRICE_STEP_TICKS);
            let detail = format!(
                "dist_from_ema={:.5}, atr={:.5}, rsi={:.2}, sl_mult={}",
                dist_from_ema, atr, current.rsi, cfg.sl_atr_multiplier
            );
            info!("signal confirmed: {}", detail);
            signal = signal.with_detail(detail);
        }

        Ok(signal)
    }
}
