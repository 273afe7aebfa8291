use tokio::sync::Mutex;
use tracing::{error, info};

use crate::error::app_error::AppError;
use crate::job::break_even_job::PlanBook;
use crate::trading::risk::risk_manager::RiskManager;
use crate::trading::strategy::strategy_common::SignalResult;
use crate::trading::venue::VenueApi;

/// 一次信号的下单结果
#[derive(Debug, Clone)]
pub struct OrderOutcome {
    pub requested: u32,
    pub placed: u32,
    pub volume: f64,
    pub tickets: Vec<i64>,
}

pub struct SignalOrder;

impl SignalOrder {
    /// 按配置的重复次数提交市价单
    ///
    /// 每笔成功的订单各自计入当日交易数，并把计划止盈距离
    /// 登记到PlanBook供保本任务使用。单笔失败不影响后续提交。
    pub async fn execute(
        venue: &dyn VenueApi,
        risk_manager: &Mutex<RiskManager>,
        plan_book: &Mutex<PlanBook>,
        symbol: &str,
        signal: &SignalResult,
        volume: f64,
        repeat_count: u32,
    ) -> Result<OrderOutcome, AppError> {
        let side = signal
            .direction()
            .ok_or_else(|| AppError::Unknown("execute called without signal".to_string()))?;

        let mut outcome = OrderOutcome {
            requested: repeat_count,
            placed: 0,
            volume,
            tickets: Vec::new(),
        };

        for _ in 0..repeat_count {
            match venue
                .place_order(symbol, side, volume, signal.stop_loss, signal.take_profit)
                .await
            {
                Ok(ticket) => {
                    outcome.placed += 1;
                    outcome.tickets.push(ticket.ticket);
                    risk_manager.lock().await.record_trade();
                    if signal.take_profit > 0.0 {
                        plan_book
                            .lock()
                            .await
                            .record(ticket.ticket, (signal.take_profit - ticket.price).abs());
                    }
                }
                Err(e) => {
                    // 本轮内不做自动重试，留给下一次信号
                    error!("order failed for {} {}: {}", side, symbol, e);
                }
            }
        }

        if outcome.placed > 0 {
            info!(
                "orders placed: {} x{} {} {} lots",
                side, outcome.placed, symbol, volume
            );
        }
        Ok(outcome)
    }
}
