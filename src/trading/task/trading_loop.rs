use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::Retry;
use tracing::{debug, error, info, warn};

use crate::app_config::settings::AppConfig;
use crate::error::app_error::AppError;
use crate::job::break_even_job::{BreakEvenJob, PlanBook};
use crate::time_util;
use crate::trading::analysis::market_analyzer::MarketAnalyzer;
use crate::trading::order::SignalOrder;
use crate::trading::risk::risk_manager::{calculate_lot_size, LotSizer, RiskManager};
use crate::trading::services::telegram_bot::TelegramBot;
use crate::trading::services::trading_switch::TradingSwitch;
use crate::trading::strategy::razgon_strategy::{RazgonStrategy, RazgonStrategyConfig};
use crate::trading::venue::VenueApi;

/// 高周期取数长度
const HTF_BAR_COUNT: usize = 100;
/// 低周期取数长度
const LTF_BAR_COUNT: usize = 300;
/// 心跳日志间隔
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// 交易主循环
///
/// 单任务顺序评估所有品种，品种间不做并行；
/// 与Telegram监听任务只通过TradingSwitch和RiskManager交互。
pub struct TradingLoop {
    config: Arc<AppConfig>,
    venue: Arc<dyn VenueApi>,
    switch: Arc<TradingSwitch>,
    risk_manager: Arc<Mutex<RiskManager>>,
    plan_book: Arc<Mutex<PlanBook>>,
    bot: Arc<TelegramBot>,
    lot_sizer: Box<dyn LotSizer>,
    break_even_job: BreakEvenJob,
}

impl TradingLoop {
    pub fn new(
        config: Arc<AppConfig>,
        venue: Arc<dyn VenueApi>,
        switch: Arc<TradingSwitch>,
        risk_manager: Arc<Mutex<RiskManager>>,
        plan_book: Arc<Mutex<PlanBook>>,
        bot: Arc<TelegramBot>,
        lot_sizer: Box<dyn LotSizer>,
    ) -> Self {
        let break_even_job = BreakEvenJob::new(config.owner_tag);
        Self {
            config,
            venue,
            switch,
            risk_manager,
            plan_book,
            bot,
            lot_sizer,
            break_even_job,
        }
    }

    /// 主循环入口，只有进程退出才会结束
    pub async fn run(&self) -> anyhow::Result<()> {
        info!("trading loop started");

        let mut connected = self.try_connect().await;
        if !connected {
            error!("initial connection failed, trading loop will keep retrying");
        }

        let mut last_report: Option<Instant> = None;
        let mut last_heartbeat = Instant::now();

        loop {
            let idle = self
                .tick(&mut connected, &mut last_report, &mut last_heartbeat)
                .await;
            tokio::time::sleep(idle).await;
        }
    }

    /// 带退避的重连，成功后设定当日回撤基准
    async fn try_connect(&self) -> bool {
        let strategy = ExponentialBackoff::from_millis(500)
            .max_delay(Duration::from_secs(10))
            .take(4);
        let venue = Arc::clone(&self.venue);
        let result = Retry::spawn(strategy, move || {
            let venue = Arc::clone(&venue);
            async move {
                match venue.connect().await {
                    Ok(true) => Ok(()),
                    Ok(false) => Err(AppError::Connectivity("venue refused connection".to_string())),
                    Err(e) => Err(e),
                }
            }
        })
        .await;

        match result {
            Ok(()) => {
                // 当日首次连接成功时以账户余额为回撤基准
                match self.venue.get_account_state().await {
                    Ok(account) => {
                        let mut risk = self.risk_manager.lock().await;
                        if risk.baseline_is_stale(&time_util::utc_date_string()) {
                            risk.set_daily_start_balance(account.balance);
                        }
                    }
                    Err(e) => warn!("account state unavailable after connect: {}", e),
                }
                true
            }
            Err(e) => {
                error!("venue connection failed: {}", e);
                false
            }
        }
    }

    /// 单次tick，返回距下一次tick的空闲时长
    ///
    /// 任何阶段的失败都在这里消化掉，单个坏tick不会中断循环。
    async fn tick(
        &self,
        connected: &mut bool,
        last_report: &mut Option<Instant>,
        last_heartbeat: &mut Instant,
    ) -> Duration {
        // 心跳
        if last_heartbeat.elapsed() >= HEARTBEAT_INTERVAL {
            let status = if self.switch.is_enabled() {
                "Trading Active"
            } else {
                "Trading Paused (waiting for /on)"
            };
            info!("heartbeat: {}", status);
            *last_heartbeat = Instant::now();
        }

        // 连接维护
        if !*connected {
            *connected = self.try_connect().await;
            if !*connected {
                return Duration::from_secs(self.config.reconnect_idle_secs);
            }
        }

        // 全局开关
        if !self.switch.is_enabled() {
            return Duration::from_secs(self.config.disabled_idle_secs);
        }

        // 风控闸门
        let account = match self.venue.get_account_state().await {
            Ok(account) => account,
            Err(e) => {
                error!("account state fetch failed, reconnecting next tick: {}", e);
                *connected = false;
                return Duration::from_secs(self.config.reconnect_idle_secs);
            }
        };
        let (can_trade, reason) = {
            let risk = self.risk_manager.lock().await;
            risk.can_trade(time_util::utc_time_of_day(), account.equity)
        };
        if !can_trade {
            debug!("risk gate closed: {}", reason);
            return Duration::from_secs(self.config.risk_idle_secs);
        }

        // 保本移动
        {
            let mut plan_book = self.plan_book.lock().await;
            if let Err(e) = self
                .break_even_job
                .run(self.venue.as_ref(), &mut plan_book)
                .await
            {
                error!("break-even scan failed: {}", e);
            }
        }

        // 定时行情播报
        let report_due = match last_report {
            None => true,
            Some(at) => at.elapsed() >= Duration::from_secs(self.config.report_interval_secs),
        };
        if report_due {
            self.broadcast_reports().await;
            *last_report = Some(Instant::now());
        }

        // 逐品种评估，后评估的品种能看到本tick刚下的订单
        for symbol in &self.config.symbol_list {
            if let Err(e) = self.evaluate_symbol(symbol).await {
                if e.is_data_error() {
                    debug!("skip {} this tick: {}", symbol, e);
                } else {
                    error!("evaluation failed for {}: {}", symbol, e);
                }
            }
        }

        Duration::from_secs(self.config.tick_sleep_secs)
    }

    async fn broadcast_reports(&self) {
        for symbol in &self.config.symbol_list {
            match MarketAnalyzer::get_market_report(self.venue.as_ref(), &self.config, symbol).await
            {
                Ok(report) => {
                    if let Err(e) = self.bot.send_message(&report).await {
                        error!("market report send failed for {}: {}", symbol, e);
                    } else {
                        info!("sent market report for {}", symbol);
                    }
                }
                Err(e) => warn!("market report skipped for {}: {}", symbol, e),
            }
        }
    }

    /// 单个品种的一轮评估：取数、出信号、过闸、下单、通知
    async fn evaluate_symbol(&self, symbol: &str) -> Result<(), AppError> {
        // 单品种同时只持一仓，有仓则不再进场
        let positions = self.venue.get_open_positions(self.config.owner_tag).await?;
        if positions.iter().any(|p| p.symbol == symbol) {
            return Ok(());
        }

        let instrument = self.venue.get_instrument_info(symbol).await?;
        let htf_candles = self
            .venue
            .get_bars(symbol, &self.config.timeframe_htf, HTF_BAR_COUNT)
            .await?;
        let ltf_candles = self
            .venue
            .get_bars(symbol, &self.config.timeframe_ltf, LTF_BAR_COUNT)
            .await?;

        let strategy_config = RazgonStrategyConfig::for_symbol(&self.config, symbol);
        let signal = RazgonStrategy::get_trade_signal(
            &htf_candles,
            &ltf_candles,
            instrument.tick_size,
            &strategy_config,
        )?;
        let direction = match signal.direction() {
            Some(direction) => direction,
            None => return Ok(()),
        };
        info!("SIGNAL FOUND: {} {}", symbol, direction);

        let volume = calculate_lot_size(self.lot_sizer.as_ref(), &instrument, signal.sl_steps);
        if volume <= 0.0 {
            warn!("calculated volume 0 for {}, skipped", symbol);
            return Ok(());
        }

        let outcome = SignalOrder::execute(
            self.venue.as_ref(),
            &self.risk_manager,
            &self.plan_book,
            symbol,
            &signal,
            volume,
            self.config.order_repeat_count,
        )
        .await?;

        if outcome.placed > 0 {
            let msg = format!(
                "🚀 *New Trade Executed (x{})*\n\
                 Symbol: {}\n\
                 Type: {}\n\
                 Volume: {} x {}\n\
                 Price: {:.5}\n\
                 SL: {:.5}\n\
                 TP: {:.5}",
                outcome.placed,
                symbol,
                direction,
                volume,
                outcome.placed,
                signal.price,
                signal.stop_loss,
                signal.take_profit
            );
            if let Err(e) = self.bot.send_message(&msg).await {
                error!("trade notice send failed: {}", e);
            }
        }
        Ok(())
    }
}
