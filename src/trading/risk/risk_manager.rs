use std::fmt;

use chrono::NaiveTime;
use tracing::{info, warn};

use crate::app_config::settings::AppConfig;
use crate::time_util;
use crate::trading::venue::InstrumentInfo;

/// 风控拒绝原因，仅用于观测，不参与控制流
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskReason {
    Ok,
    OutsideSession,
    DailyDrawdown,
    MaxTradesReached,
}

impl fmt::Display for RiskReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskReason::Ok => write!(f, "OK"),
            RiskReason::OutsideSession => write!(f, "Outside Trading Session"),
            RiskReason::DailyDrawdown => write!(f, "Daily Drawdown Limit Hit"),
            RiskReason::MaxTradesReached => write!(f, "Max Daily Trades Reached"),
        }
    }
}

/// 盘中风控状态，进程生命周期内常驻
///
/// daily_start_balance与trades_today每个交易日重置一次，
/// trades_today只在订单真正提交成功后加一。
#[derive(Debug)]
pub struct RiskManager {
    pub daily_start_balance: f64,
    pub trades_today: u32,
    pub max_trades_per_day: u32,
    session_start: NaiveTime,
    session_end: NaiveTime,
    max_daily_drawdown_pct: f64,
    /// 基准所属的UTC日期，跨日后需要重新设定
    baseline_date: Option<String>,
}

impl RiskManager {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            daily_start_balance: 0.0,
            trades_today: 0,
            max_trades_per_day: config.max_trades_per_day,
            session_start: config.session_start,
            session_end: config.session_end,
            max_daily_drawdown_pct: config.max_daily_drawdown,
            baseline_date: None,
        }
    }

    /// 每日开盘或重连成功后调用一次
    pub fn set_daily_start_balance(&mut self, balance: f64) {
        self.daily_start_balance = balance;
        self.baseline_date = Some(time_util::utc_date_string());
        info!("daily start balance set to: {}", self.daily_start_balance);
    }

    /// 基准是否需要重设：从未设置过，或者已经跨日
    pub fn baseline_is_stale(&self, today: &str) -> bool {
        self.daily_start_balance <= 0.0 || self.baseline_date.as_deref() != Some(today)
    }

    /// 新交易日重置：清空计数并以最新余额为基准
    pub fn reset_daily(&mut self, balance: f64) {
        self.trades_today = 0;
        self.set_daily_start_balance(balance);
    }

    /// 订单提交成功后计数
    pub fn record_trade(&mut self) {
        self.trades_today += 1;
    }

    pub fn is_trading_session(&self, now: NaiveTime) -> bool {
        time_util::in_session_window(now, self.session_start, self.session_end)
    }

    /// 日内回撤检查，true表示未触及回撤上限
    pub fn check_daily_drawdown(&self, equity: f64) -> bool {
        if self.daily_start_balance <= 0.0 {
            // 基准未初始化时不做回撤限制
            return true;
        }
        let current_loss_pct =
            (self.daily_start_balance - equity) / self.daily_start_balance * 100.0;
        if current_loss_pct >= self.max_daily_drawdown_pct {
            warn!(
                "daily drawdown hit! -{:.2}% >= {}%",
                current_loss_pct, self.max_daily_drawdown_pct
            );
            return false;
        }
        true
    }

    /// 开新仓总闸，三项检查全部通过才放行
    pub fn can_trade(&self, now: NaiveTime, equity: f64) -> (bool, RiskReason) {
        if !self.is_trading_session(now) {
            return (false, RiskReason::OutsideSession);
        }
        if !self.check_daily_drawdown(equity) {
            return (false, RiskReason::DailyDrawdown);
        }
        if self.trades_today >= self.max_trades_per_day {
            return (false, RiskReason::MaxTradesReached);
        }
        (true, RiskReason::Ok)
    }
}

/// 手数计算策略，固定手数只是其中一种实现
pub trait LotSizer: Send + Sync {
    /// 返回原始手数，边界处理由normalize_volume统一负责
    fn raw_lot_size(&self, instrument: &InstrumentInfo, sl_steps: f64) -> f64;
}

/// 固定手数
pub struct FixedLotSizer {
    pub lot: f64,
}

impl LotSizer for FixedLotSizer {
    fn raw_lot_size(&self, _instrument: &InstrumentInfo, _sl_steps: f64) -> f64 {
        self.lot
    }
}

/// 按账户余额的风险百分比折算手数
pub struct RiskPercentLotSizer {
    pub risk_percent: f64,
    pub balance: f64,
    /// 一手头寸每个价格步长对应的货币价值
    pub step_value_per_lot: f64,
}

impl LotSizer for RiskPercentLotSizer {
    fn raw_lot_size(&self, _instrument: &InstrumentInfo, sl_steps: f64) -> f64 {
        if sl_steps <= 0.0 || self.step_value_per_lot <= 0.0 {
            return 0.0;
        }
        let risk_amount = self.balance * self.risk_percent / 100.0;
        risk_amount / (sl_steps * self.step_value_per_lot)
    }
}

/// 手数对齐到volume_step的整数倍并收敛到[min_volume, max_volume]
pub fn normalize_volume(instrument: &InstrumentInfo, volume: f64) -> f64 {
    let step = if instrument.volume_step > 0.0 {
        instrument.volume_step
    } else {
        instrument.min_volume
    };
    if !volume.is_finite() || volume <= 0.0 {
        return instrument.min_volume;
    }

    // 浮点步进时加微小偏移再取整，避免0.07/0.01=6.999..的截断
    let stepped = ((volume / step) + 1e-9).floor() * step;
    let max_stepped = ((instrument.max_volume / step) + 1e-9).floor() * step;
    if stepped < instrument.min_volume {
        instrument.min_volume
    } else if stepped > max_stepped {
        max_stepped
    } else {
        stepped
    }
}

/// 计算最终下单手数
pub fn calculate_lot_size(
    sizer: &dyn LotSizer,
    instrument: &InstrumentInfo,
    sl_steps: f64,
) -> f64 {
    let raw = sizer.raw_lot_size(instrument, sl_steps);
    normalize_volume(instrument, raw)
}
