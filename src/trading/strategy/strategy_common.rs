use serde::{Deserialize, Serialize};

use crate::trading::venue::OrderSide;

/// 策略单次评估的结果，最多只有一个方向成立
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignalResult {
    pub should_buy: bool,
    pub should_sell: bool,
    /// 评估时刻的收盘价
    pub price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// 止损距离，以价格步长（tick_size * 10）计
    pub sl_steps: f64,
    pub ts: i64,
    pub detail: Option<String>,
}

impl SignalResult {
    pub fn no_signal(price: f64, ts: i64) -> Self {
        Self {
            should_buy: false,
            should_sell: false,
            price,
            stop_loss: 0.0,
            take_profit: 0.0,
            sl_steps: 0.0,
            ts,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: String) -> Self {
        self.detail = Some(detail);
        self
    }

    /// 信号方向，无信号时为None
    pub fn direction(&self) -> Option<OrderSide> {
        if self.should_buy {
            Some(OrderSide::Buy)
        } else if self.should_sell {
            Some(OrderSide::Sell)
        } else {
            None
        }
    }

    pub fn has_signal(&self) -> bool {
        self.should_buy || self.should_sell
    }
}
