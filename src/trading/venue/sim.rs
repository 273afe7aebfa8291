use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

use crate::error::app_error::AppError;
use crate::trading::venue::{
    AccountState, InstrumentInfo, OrderSide, OrderTicket, VenueApi, VenuePosition,
};
use crate::CandleItem;

#[derive(Debug, Default)]
struct SimState {
    connected: bool,
    fail_connect: bool,
    reject_orders: bool,
    balance: f64,
    equity: f64,
    instruments: HashMap<String, InstrumentInfo>,
    bars: HashMap<(String, String), Vec<CandleItem>>,
    prices: HashMap<String, f64>,
    positions: Vec<VenuePosition>,
    next_ticket: i64,
    orders_placed: u32,
    stops_modified: u32,
}

/// 模拟盘网关，用于paper模式与测试
pub struct SimVenue {
    owner_tag: i64,
    state: Mutex<SimState>,
}

impl SimVenue {
    pub fn new(owner_tag: i64) -> Self {
        let state = SimState {
            balance: 10000.0,
            equity: 10000.0,
            next_ticket: 1000,
            ..Default::default()
        };
        Self {
            owner_tag,
            state: Mutex::new(state),
        }
    }

    pub fn seed_instrument(&self, info: InstrumentInfo) {
        let mut state = self.state.lock().unwrap();
        state.instruments.insert(info.symbol.clone(), info);
    }

    pub fn seed_bars(&self, symbol: &str, timeframe: &str, bars: Vec<CandleItem>) {
        let mut state = self.state.lock().unwrap();
        if let Some(last) = bars.last() {
            state.prices.insert(symbol.to_string(), last.c());
        }
        state
            .bars
            .insert((symbol.to_string(), timeframe.to_string()), bars);
    }

    pub fn set_account(&self, balance: f64, equity: f64) {
        let mut state = self.state.lock().unwrap();
        state.balance = balance;
        state.equity = equity;
    }

    pub fn set_price(&self, symbol: &str, price: f64) {
        let mut state = self.state.lock().unwrap();
        state.prices.insert(symbol.to_string(), price);
        for pos in state.positions.iter_mut() {
            if pos.symbol == symbol {
                pos.current_price = price;
            }
        }
    }

    pub fn set_fail_connect(&self, fail: bool) {
        self.state.lock().unwrap().fail_connect = fail;
    }

    pub fn set_reject_orders(&self, reject: bool) {
        self.state.lock().unwrap().reject_orders = reject;
    }

    pub fn push_position(&self, position: VenuePosition) {
        self.state.lock().unwrap().positions.push(position);
    }

    pub fn positions_snapshot(&self) -> Vec<VenuePosition> {
        self.state.lock().unwrap().positions.clone()
    }

    pub fn orders_placed(&self) -> u32 {
        self.state.lock().unwrap().orders_placed
    }

    pub fn stops_modified(&self) -> u32 {
        self.state.lock().unwrap().stops_modified
    }
}

#[async_trait]
impl VenueApi for SimVenue {
    async fn connect(&self) -> Result<bool, AppError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_connect {
            return Err(AppError::Connectivity("sim venue offline".to_string()));
        }
        state.connected = true;
        Ok(true)
    }

    async fn get_instrument_info(&self, symbol: &str) -> Result<InstrumentInfo, AppError> {
        let state = self.state.lock().unwrap();
        state
            .instruments
            .get(symbol)
            .cloned()
            .ok_or_else(|| AppError::DataUnavailable(format!("unknown instrument {}", symbol)))
    }

    async fn get_bars(
        &self,
        symbol: &str,
        timeframe: &str,
        count: usize,
    ) -> Result<Vec<CandleItem>, AppError> {
        let state = self.state.lock().unwrap();
        let bars = state
            .bars
            .get(&(symbol.to_string(), timeframe.to_string()))
            .ok_or_else(|| {
                AppError::DataUnavailable(format!("no bars for {} {}", symbol, timeframe))
            })?;
        let start = bars.len().saturating_sub(count);
        Ok(bars[start..].to_vec())
    }

    async fn get_account_state(&self) -> Result<AccountState, AppError> {
        let state = self.state.lock().unwrap();
        Ok(AccountState {
            balance: state.balance,
            equity: state.equity,
        })
    }

    async fn get_open_positions(&self, owner_tag: i64) -> Result<Vec<VenuePosition>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .positions
            .iter()
            .filter(|p| p.owner_tag == owner_tag)
            .cloned()
            .collect())
    }

    async fn place_order(
        &self,
        symbol: &str,
        side: OrderSide,
        volume: f64,
        stop_loss: f64,
        take_profit: f64,
    ) -> Result<OrderTicket, AppError> {
        let mut state = self.state.lock().unwrap();
        if !state.connected {
            return Err(AppError::Connectivity("sim venue not connected".to_string()));
        }
        if state.reject_orders {
            return Err(AppError::OrderRejected("sim venue rejects orders".to_string()));
        }
        let price = state.prices.get(symbol).copied().ok_or_else(|| {
            AppError::DataUnavailable(format!("no market price for {}", symbol))
        })?;
        state.next_ticket += 1;
        let ticket = state.next_ticket;
        let owner_tag = self.owner_tag;
        state.positions.push(VenuePosition {
            ticket,
            symbol: symbol.to_string(),
            side,
            open_price: price,
            current_price: price,
            stop_loss,
            take_profit,
            volume,
            owner_tag,
        });
        state.orders_placed += 1;
        info!("sim order placed: {} {} {} @ {}", side, volume, symbol, price);
        Ok(OrderTicket { ticket, price })
    }

    async fn modify_stop(
        &self,
        ticket: i64,
        stop_loss: f64,
        take_profit: f64,
    ) -> Result<bool, AppError> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        for pos in state.positions.iter_mut() {
            if pos.ticket == ticket {
                pos.stop_loss = stop_loss;
                pos.take_profit = take_profit;
                state.stops_modified += 1;
                return Ok(true);
            }
        }
        Err(AppError::OrderRejected(format!("unknown ticket {}", ticket)))
    }

    async fn disconnect(&self) -> Result<(), AppError> {
        self.state.lock().unwrap().connected = false;
        Ok(())
    }
}
