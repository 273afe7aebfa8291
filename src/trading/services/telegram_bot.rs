use std::str::FromStr;
use std::sync::Arc;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::app_config::settings::AppConfig;
use crate::error::app_error::AppError;
use crate::job::break_even_job::PlanBook;
use crate::trading::analysis::market_analyzer::MarketAnalyzer;
use crate::trading::risk::risk_manager::RiskManager;
use crate::trading::services::trading_switch::TradingSwitch;
use crate::trading::venue::{OrderSide, VenueApi};

const TELEGRAM_API: &str = "https://api.telegram.org";
/// getUpdates长轮询的等待时间（秒）
const POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
struct IncomingMessage {
    text: Option<String>,
}

/// Telegram控制通道
///
/// 独立于交易循环的并发监听任务，是交易开关在循环外的唯一写入方。
pub struct TelegramBot {
    client: Client,
    token: String,
    chat_id: String,
    config: Arc<AppConfig>,
    switch: Arc<TradingSwitch>,
    risk_manager: Arc<Mutex<RiskManager>>,
    plan_book: Arc<Mutex<PlanBook>>,
    venue: Arc<dyn VenueApi>,
}

impl TelegramBot {
    pub fn new(
        config: Arc<AppConfig>,
        switch: Arc<TradingSwitch>,
        risk_manager: Arc<Mutex<RiskManager>>,
        plan_book: Arc<Mutex<PlanBook>>,
        venue: Arc<dyn VenueApi>,
    ) -> Self {
        Self {
            client: Client::new(),
            token: config.telegram_bot_token.clone(),
            chat_id: config.telegram_chat_id.clone(),
            config,
            switch,
            risk_manager,
            plan_book,
            venue,
        }
    }

    /// 向配置的会话推送消息，用于新单通知与定时报告
    pub async fn send_message(&self, text: &str) -> Result<(), AppError> {
        if self.chat_id.is_empty() {
            warn!("cannot send proactive message: TELEGRAM_CHAT_ID not set");
            return Ok(());
        }
        let url = format!("{}/bot{}/sendMessage", TELEGRAM_API, self.token);
        let body = json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });
        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            error!("failed to send telegram msg: {} {}", status, text);
        }
        Ok(())
    }

    async fn poll_updates(&self, offset: i64) -> Result<Vec<Update>, AppError> {
        let url = format!("{}/bot{}/getUpdates", TELEGRAM_API, self.token);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", POLL_TIMEOUT_SECS.to_string()),
            ])
            .send()
            .await?;
        let updates: UpdatesResponse = response
            .json()
            .await
            .map_err(|e| AppError::Unknown(format!("telegram decode error: {}", e)))?;
        if !updates.ok {
            return Err(AppError::Connectivity("telegram getUpdates not ok".to_string()));
        }
        Ok(updates.result)
    }

    /// 长轮询入口，作为独立任务运行
    pub async fn run(&self) -> anyhow::Result<()> {
        if self.token.is_empty() {
            error!("no telegram token provided");
            return Ok(());
        }
        info!("telegram bot polling started");

        let mut offset: i64 = 0;
        loop {
            match self.poll_updates(offset).await {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        let text = update.message.and_then(|m| m.text);
                        if let Some(text) = text {
                            let reply = self.handle_command(text.trim()).await;
                            if !reply.is_empty() {
                                if let Err(e) = self.send_message(&reply).await {
                                    error!("telegram reply failed: {}", e);
                                }
                            }
                        }
                    }
                }
                Err(e) => {
                    error!("telegram polling error: {}", e);
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                }
            }
        }
    }

    /// 命令分发，返回要回复的文本（空串表示不回复）
    pub async fn handle_command(&self, text: &str) -> String {
        let mut parts = text.split_whitespace();
        let command = match parts.next() {
            Some(c) => c.to_lowercase(),
            None => return String::new(),
        };
        let args: Vec<&str> = parts.collect();

        match command.as_str() {
            "/start" => "🚀 *Razgon Bot - Control Panel*\n\
                         /on - enable trading\n\
                         /off - disable trading\n\
                         /status - bot status\n\
                         /balance - account state\n\
                         /buy SYMBOL VOLUME [SL] [TP]\n\
                         /sell SYMBOL VOLUME [SL] [TP]\n\
                         /report [SYMBOL] - market analysis"
                .to_string(),
            "/on" => {
                self.switch.enable();
                info!("user enabled trading via telegram");
                "✅ Trading ENABLED".to_string()
            }
            "/off" => {
                self.switch.disable();
                info!("user disabled trading via telegram");
                "⛔ Trading DISABLED".to_string()
            }
            "/status" | "/balance" => self.status_text().await,
            "/buy" => self.manual_trade(OrderSide::Buy, &args).await,
            "/sell" => self.manual_trade(OrderSide::Sell, &args).await,
            "/report" => {
                let symbol = args
                    .first()
                    .map(|s| s.to_uppercase())
                    .unwrap_or_else(|| self.config.symbol_list[0].clone());
                match MarketAnalyzer::get_market_report(self.venue.as_ref(), &self.config, &symbol)
                    .await
                {
                    Ok(report) => report,
                    Err(e) => {
                        error!("market report failed for {}: {}", symbol, e);
                        "❌ Analysis failed or no data.".to_string()
                    }
                }
            }
            // 非命令消息一律忽略
            _ => String::new(),
        }
    }

    async fn status_text(&self) -> String {
        let status = if self.switch.is_enabled() {
            "🟢 Active"
        } else {
            "🔴 Paused"
        };
        let (trades_today, max_trades) = {
            let risk = self.risk_manager.lock().await;
            (risk.trades_today, risk.max_trades_per_day)
        };
        let (balance, equity) = match self.venue.get_account_state().await {
            Ok(account) => (
                format!("{:.2}", account.balance),
                format!("{:.2}", account.equity),
            ),
            Err(_) => ("N/A".to_string(), "N/A".to_string()),
        };
        format!(
            "📊 *Status*: {}\n💰 *Balance*: {}\n📉 *Equity*: {}\n🎲 *Trades Today*: {}/{}",
            status, balance, equity, trades_today, max_trades
        )
    }

    /// 手动下单：/buy SYMBOL VOLUME [SL] [TP]
    async fn manual_trade(&self, side: OrderSide, args: &[&str]) -> String {
        if !self.switch.is_enabled() {
            return "⚠️ Trading is DISABLED. Use /on first.".to_string();
        }
        if args.len() < 2 {
            return format!("Usage: /{} SYMBOL VOLUME [SL] [TP]", side.to_string().to_lowercase());
        }

        let symbol = args[0].to_uppercase();
        let volume = match f64::from_str(args[1]) {
            Ok(v) if v > 0.0 => v,
            _ => return format!("❌ invalid volume: {}", args[1]),
        };
        let stop_loss = args.get(2).and_then(|s| f64::from_str(s).ok()).unwrap_or(0.0);
        let take_profit = args.get(3).and_then(|s| f64::from_str(s).ok()).unwrap_or(0.0);

        match self
            .venue
            .place_order(&symbol, side, volume, stop_loss, take_profit)
            .await
        {
            Ok(ticket) => {
                self.risk_manager.lock().await.record_trade();
                if take_profit > 0.0 {
                    self.plan_book
                        .lock()
                        .await
                        .record(ticket.ticket, (take_profit - ticket.price).abs());
                }
                format!(
                    "✅ Order Placed: {} {} {}\nTicket: {}",
                    side, symbol, volume, ticket.ticket
                )
            }
            Err(e) => {
                error!("manual trade failed: {}", e);
                "❌ Order Failed. Check logs.".to_string()
            }
        }
    }
}
