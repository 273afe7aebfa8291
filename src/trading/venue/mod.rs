pub mod bridge;
pub mod sim;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::app_error::AppError;
use crate::CandleItem;

/// 订单方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for OrderSide {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BUY" => Ok(OrderSide::Buy),
            "SELL" => Ok(OrderSide::Sell),
            other => Err(AppError::Unknown(format!("invalid order side: {}", other))),
        }
    }
}

/// 品种元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentInfo {
    pub symbol: String,
    /// 最小报价单位
    pub tick_size: f64,
    pub min_volume: f64,
    pub max_volume: f64,
    pub volume_step: f64,
    pub spread: f64,
}

/// 账户状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AccountState {
    pub balance: f64,
    pub equity: f64,
}

/// 持仓镜像，所有字段由交易网关拥有，本系统只读
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenuePosition {
    pub ticket: i64,
    pub symbol: String,
    pub side: OrderSide,
    pub open_price: f64,
    pub current_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub volume: f64,
    pub owner_tag: i64,
}

/// 下单回执
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderTicket {
    pub ticket: i64,
    pub price: f64,
}

/// 交易网关接口
#[async_trait]
pub trait VenueApi: Send + Sync {
    async fn connect(&self) -> Result<bool, AppError>;

    async fn get_instrument_info(&self, symbol: &str) -> Result<InstrumentInfo, AppError>;

    /// 返回按时间升序排列的K线序列
    async fn get_bars(
        &self,
        symbol: &str,
        timeframe: &str,
        count: usize,
    ) -> Result<Vec<CandleItem>, AppError>;

    async fn get_account_state(&self) -> Result<AccountState, AppError>;

    /// 仅返回带指定owner_tag的持仓，其他持仓一律忽略
    async fn get_open_positions(&self, owner_tag: i64) -> Result<Vec<VenuePosition>, AppError>;

    async fn place_order(
        &self,
        symbol: &str,
        side: OrderSide,
        volume: f64,
        stop_loss: f64,
        take_profit: f64,
    ) -> Result<OrderTicket, AppError>;

    async fn modify_stop(
        &self,
        ticket: i64,
        stop_loss: f64,
        take_profit: f64,
    ) -> Result<bool, AppError>;

    async fn disconnect(&self) -> Result<(), AppError>;
}
