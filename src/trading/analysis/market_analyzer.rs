use std::fmt;

use tracing::error;

use crate::app_config::settings::AppConfig;
use crate::error::app_error::AppError;
use crate::trading::indicator::indicator_combine::{IndicatorCombine, IndicatorFrame};
use crate::trading::venue::VenueApi;
use crate::CandleItem;

/// 趋势判断需要的最少有效K线数量
const MIN_TREND_BARS: usize = 50;
/// 斜率比较的回看距离
const SLOPE_LOOKBACK: usize = 5;
/// 支撑阻力扫描的默认窗口
pub const DEFAULT_LEVEL_LOOKBACK: usize = 20;
/// 关键位邻近判断的距离，以价格步长计
const NEARBY_LEVEL_STEPS: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Up,
    Down,
    Range,
    Unknown,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Up => write!(f, "UPTREND 🟢"),
            TrendDirection::Down => write!(f, "DOWNTREND 🔴"),
            TrendDirection::Range => write!(f, "RANGING 🟡"),
            TrendDirection::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelKind {
    Support,
    Resistance,
}

/// 支撑/阻力位，每次报告时重新计算，从不落盘
#[derive(Debug, Clone, Copy)]
pub struct Level {
    pub kind: LevelKind,
    pub price: f64,
}

pub struct MarketAnalyzer;

impl MarketAnalyzer {
    /// 根据均线排列和慢线斜率判断趋势
    pub fn identify_trend(frames: &[IndicatorFrame]) -> TrendDirection {
        let ready_count = frames.iter().filter(|f| f.is_ready).count();
        if ready_count < MIN_TREND_BARS || frames.len() <= SLOPE_LOOKBACK {
            return TrendDirection::Unknown;
        }

        let current = &frames[frames.len() - 1];
        let past = &frames[frames.len() - 1 - SLOPE_LOOKBACK];
        let slope_slow = current.ema_slow - past.ema_slow;

        if current.ema_fast > current.ema_slow && slope_slow > 0.0 {
            TrendDirection::Up
        } else if current.ema_fast < current.ema_slow && slope_slow < 0.0 {
            TrendDirection::Down
        } else {
            TrendDirection::Range
        }
    }

    /// 在对称窗口内找严格的局部高低点作为阻力/支撑
    ///
    /// O(n * lookback)扫描，相邻的关键位不做去重，由调用方自行处理。
    pub fn find_levels(candles: &[CandleItem], lookback: usize) -> Vec<Level> {
        let mut levels = Vec::new();
        if lookback == 0 || candles.len() < 2 * lookback + 1 {
            return levels;
        }

        for i in lookback..candles.len() - lookback {
            let is_pivot_high = (1..lookback).all(|k| {
                candles[i].h() > candles[i - k].h() && candles[i].h() > candles[i + k].h()
            });
            if is_pivot_high {
                levels.push(Level {
                    kind: LevelKind::Resistance,
                    price: candles[i].h(),
                });
            }

            let is_pivot_low = (1..lookback).all(|k| {
                candles[i].l() < candles[i - k].l() && candles[i].l() < candles[i + k].l()
            });
            if is_pivot_low {
                levels.push(Level {
                    kind: LevelKind::Support,
                    price: candles[i].l(),
                });
            }
        }
        levels
    }

    /// 距离当前价格最近的关键位
    pub fn nearest_level(levels: &[Level], price: f64) -> Option<(Level, f64)> {
        levels
            .iter()
            .map(|lvl| (*lvl, (price - lvl.price).abs()))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// 生成单个品种的行情报告文本，用于Telegram播报
    pub async fn get_market_report(
        venue: &dyn VenueApi,
        config: &AppConfig,
        symbol: &str,
    ) -> Result<String, AppError> {
        let candles = venue.get_bars(symbol, &config.timeframe_htf, 200).await?;
        let frames = IndicatorCombine::calculate_frames(
            &candles,
            config.ema_fast,
            config.ema_slow,
            config.rsi_period,
            config.atr_period,
        )?;

        let trend = Self::identify_trend(&frames);
        let levels = Self::find_levels(&candles, DEFAULT_LEVEL_LOOKBACK);
        let current_price = candles.last().map(|c| c.c()).unwrap_or(0.0);

        let tick_size = match venue.get_instrument_info(symbol).await {
            Ok(info) => info.tick_size,
            Err(e) => {
                error!("instrument info unavailable for {}: {}", symbol, e);
                0.00001
            }
        };
        let nearby_threshold = tick_size * NEARBY_LEVEL_STEPS;

        let mut nearby_msg = "✅ No key zone nearby, the road is open.".to_string();
        let mut advice = String::new();

        if let Some((level, dist)) = Self::nearest_level(&levels, current_price) {
            let kind_label = match level.kind {
                LevelKind::Resistance => "Strong zone above (Resistance)",
                LevelKind::Support => "Strong zone below (Support)",
            };
            nearby_msg = format!("⚠️ {}: {:.5}", kind_label, level.price);

            advice = match (trend, level.kind) {
                (TrendDirection::Up, LevelKind::Resistance) if dist < nearby_threshold => {
                    "💡 Price is rising but close to a strong zone. Buying here may be risky."
                }
                (TrendDirection::Down, LevelKind::Support) if dist < nearby_threshold => {
                    "💡 Price is falling but close to a support zone. Do not rush to sell."
                }
                (TrendDirection::Up, _) => {
                    "💡 Trend is up. Look for a convenient spot to BUY."
                }
                (TrendDirection::Down, _) => {
                    "💡 Trend is down. Look for a convenient spot to SELL."
                }
                _ => "💡 Market has no clear direction. Trade carefully with small targets.",
            }
            .to_string();
        }

        let report = format!(
            "📊 *Market Analysis: {}*\n\
             -----------------------------\n\
             📈 *Trend*: {}\n\
             💰 *Price*: {:.5}\n\
             -----------------------------\n\
             {}\n\n\
             {}",
            symbol, trend, current_price, nearby_msg, advice
        );
        Ok(report)
    }
}
