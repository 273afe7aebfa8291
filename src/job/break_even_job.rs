// 保本移动任务：扫描自有持仓，浮盈足够时把止损推到保本位

use std::collections::{HashMap, HashSet};

use log::{error, info, warn};

use crate::error::app_error::AppError;
use crate::trading::venue::{OrderSide, VenueApi, VenuePosition};

/// 触发保本移动的浮盈比例，相对计划止盈距离
const BREAK_EVEN_TRIGGER_RATIO: f64 = 0.4;
/// 保本价相对开仓价的缓冲，以价格步长计
const BREAK_EVEN_BUFFER_STEPS: f64 = 10.0;

/// 下单时登记的计划止盈距离
///
/// 网关侧的take_profit字段可能被外部改动，保本判断优先使用
/// 下单时刻快照的计划距离，查不到时才退回到实时字段。
#[derive(Debug, Default)]
pub struct PlanBook {
    planned_tp_dist: HashMap<i64, f64>,
}

impl PlanBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, ticket: i64, tp_dist: f64) {
        if tp_dist > 0.0 {
            self.planned_tp_dist.insert(ticket, tp_dist);
        }
    }

    pub fn planned_tp_dist(&self, ticket: i64) -> Option<f64> {
        self.planned_tp_dist.get(&ticket).copied()
    }

    /// 清理已平仓的登记项
    pub fn retain_open(&mut self, open_tickets: &HashSet<i64>) {
        self.planned_tp_dist
            .retain(|ticket, _| open_tickets.contains(ticket));
    }

    pub fn len(&self) -> usize {
        self.planned_tp_dist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planned_tp_dist.is_empty()
    }
}

/// 保本移动任务
pub struct BreakEvenJob {
    owner_tag: i64,
}

impl BreakEvenJob {
    pub fn new(owner_tag: i64) -> Self {
        Self { owner_tag }
    }

    /// 纯判断：需要移动时返回新止损价，否则None
    ///
    /// 只会朝减小风险的方向移动；已过保本位的持仓直接短路，
    /// 因此对同一持仓重复评估是幂等的。
    pub fn break_even_stop(
        position: &VenuePosition,
        planned_tp_dist: Option<f64>,
        tick_size: f64,
    ) -> Option<f64> {
        let tp_dist = planned_tp_dist.unwrap_or_else(|| {
            if position.take_profit > 0.0 {
                (position.take_profit - position.open_price).abs()
            } else {
                0.0
            }
        });
        if tp_dist <= 0.0 {
            return None;
        }

        let buffer = tick_size * BREAK_EVEN_BUFFER_STEPS;
        match position.side {
            OrderSide::Buy => {
                let profit_points = position.current_price - position.open_price;
                if position.stop_loss < position.open_price
                    && profit_points > tp_dist * BREAK_EVEN_TRIGGER_RATIO
                {
                    Some(position.open_price + buffer)
                } else {
                    None
                }
            }
            OrderSide::Sell => {
                let profit_points = position.open_price - position.current_price;
                if position.stop_loss > position.open_price
                    && profit_points > tp_dist * BREAK_EVEN_TRIGGER_RATIO
                {
                    Some(position.open_price - buffer)
                } else {
                    None
                }
            }
        }
    }

    /// 扫描一轮持仓，返回实际移动的数量
    pub async fn run(
        &self,
        venue: &dyn VenueApi,
        plan_book: &mut PlanBook,
    ) -> Result<u32, AppError> {
        let positions = venue.get_open_positions(self.owner_tag).await?;

        let open_tickets: HashSet<i64> = positions.iter().map(|p| p.ticket).collect();
        plan_book.retain_open(&open_tickets);

        let mut adjusted = 0;
        for position in &positions {
            let tick_size = match venue.get_instrument_info(&position.symbol).await {
                Ok(info) => info.tick_size,
                Err(e) => {
                    warn!(
                        "skip break-even for {}: instrument info unavailable: {}",
                        position.symbol, e
                    );
                    continue;
                }
            };

            let planned = plan_book.planned_tp_dist(position.ticket);
            if let Some(new_sl) = Self::break_even_stop(position, planned, tick_size) {
                match venue
                    .modify_stop(position.ticket, new_sl, position.take_profit)
                    .await
                {
                    Ok(true) => {
                        adjusted += 1;
                        info!(
                            "moved {} {} ticket {} to break-even, sl={:.5}",
                            position.side, position.symbol, position.ticket, new_sl
                        );
                    }
                    Ok(false) => {
                        error!("break-even modify rejected for ticket {}", position.ticket);
                    }
                    Err(e) => {
                        error!("break-even modify failed for ticket {}: {}", position.ticket, e);
                    }
                }
            }
        }
        Ok(adjusted)
    }
}
