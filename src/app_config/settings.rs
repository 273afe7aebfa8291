use std::collections::HashMap;

use chrono::NaiveTime;

use crate::app_config::env::{env_f64, env_i64, env_or_default, env_u32, env_u64, env_usize};
use crate::error::app_error::AppError;

/// 应用配置，启动时从环境变量加载一次
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Telegram
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,

    // MT5网关
    pub bridge_url: Option<String>,
    pub bridge_api_key: Option<String>,
    pub bridge_api_secret: Option<String>,

    // 交易品种与周期
    pub symbol_list: Vec<String>,
    pub timeframe_htf: String,
    pub timeframe_ltf: String,

    // 指标周期
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub rsi_period: usize,
    pub atr_period: usize,

    // 风控参数
    pub risk_per_trade: f64,
    pub max_daily_drawdown: f64,
    pub max_trades_per_day: u32,
    pub session_start: NaiveTime,
    pub session_end: NaiveTime,
    pub fixed_lot: f64,

    // 订单参数
    pub order_repeat_count: u32,
    pub owner_tag: i64,
    pub sl_multiplier_default: f64,
    pub sl_multiplier_overrides: HashMap<String, f64>,

    // 循环节奏
    pub report_interval_secs: u64,
    pub tick_sleep_secs: u64,
    pub risk_idle_secs: u64,
    pub disabled_idle_secs: u64,
    pub reconnect_idle_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut sl_overrides = HashMap::new();
        // GBPUSD波动更大，需要更宽的止损
        sl_overrides.insert("GBPUSD".to_string(), 3.5);
        Self {
            telegram_bot_token: String::new(),
            telegram_chat_id: String::new(),
            bridge_url: None,
            bridge_api_key: None,
            bridge_api_secret: None,
            symbol_list: vec![
                "EURUSD".to_string(),
                "GBPUSD".to_string(),
                "XAUUSD".to_string(),
            ],
            timeframe_htf: "H1".to_string(),
            timeframe_ltf: "M1".to_string(),
            ema_fast: 9,
            ema_slow: 21,
            rsi_period: 14,
            atr_period: 14,
            risk_per_trade: 2.0,
            max_daily_drawdown: 5.0,
            max_trades_per_day: 15,
            session_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            session_end: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            fixed_lot: 0.01,
            order_repeat_count: 3,
            owner_tag: 234987,
            sl_multiplier_default: 2.0,
            sl_multiplier_overrides: sl_overrides,
            report_interval_secs: 1800,
            tick_sleep_secs: 10,
            risk_idle_secs: 60,
            disabled_idle_secs: 5,
            reconnect_idle_secs: 60,
        }
    }
}

impl AppConfig {
    /// 从环境变量加载配置，未设置的项使用默认值
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let symbol_list: Vec<String> = env_or_default("SYMBOL_LIST", "EURUSD,GBPUSD,XAUUSD")
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();

        // 格式: "GBPUSD:3.5,XAUUSD:2.5"
        let mut sl_multiplier_overrides = defaults.sl_multiplier_overrides.clone();
        for entry in env_or_default("SL_MULTIPLIER_OVERRIDES", "").split(',') {
            if let Some((symbol, mult)) = entry.split_once(':') {
                if let Ok(mult) = mult.trim().parse::<f64>() {
                    sl_multiplier_overrides.insert(symbol.trim().to_uppercase(), mult);
                }
            }
        }

        Self {
            telegram_bot_token: env_or_default("TELEGRAM_BOT_TOKEN", ""),
            telegram_chat_id: env_or_default("TELEGRAM_CHAT_ID", ""),
            bridge_url: std::env::var("MT5_BRIDGE_URL").ok(),
            bridge_api_key: std::env::var("MT5_BRIDGE_API_KEY").ok(),
            bridge_api_secret: std::env::var("MT5_BRIDGE_API_SECRET").ok(),
            symbol_list,
            timeframe_htf: env_or_default("TIMEFRAME_HTF", &defaults.timeframe_htf),
            timeframe_ltf: env_or_default("TIMEFRAME_LTF", &defaults.timeframe_ltf),
            ema_fast: env_usize("EMA_FAST", defaults.ema_fast),
            ema_slow: env_usize("EMA_SLOW", defaults.ema_slow),
            rsi_period: env_usize("RSI_PERIOD", defaults.rsi_period),
            atr_period: env_usize("ATR_PERIOD", defaults.atr_period),
            risk_per_trade: env_f64("RISK_PERCENT", defaults.risk_per_trade),
            max_daily_drawdown: env_f64("MAX_DAILY_DRAWDOWN", defaults.max_daily_drawdown),
            max_trades_per_day: env_u32("MAX_TRADES_PER_DAY", defaults.max_trades_per_day),
            session_start: parse_time_env("SESSION_START", defaults.session_start),
            session_end: parse_time_env("SESSION_END", defaults.session_end),
            fixed_lot: env_f64("FIXED_LOT", defaults.fixed_lot),
            order_repeat_count: env_u32("ORDER_REPEAT_COUNT", defaults.order_repeat_count),
            owner_tag: env_i64("MAGIC_NUMBER", defaults.owner_tag),
            sl_multiplier_default: env_f64("SL_MULTIPLIER", defaults.sl_multiplier_default),
            sl_multiplier_overrides,
            report_interval_secs: env_u64("REPORT_INTERVAL_SECS", defaults.report_interval_secs),
            tick_sleep_secs: env_u64("TICK_SLEEP_SECS", defaults.tick_sleep_secs),
            risk_idle_secs: env_u64("RISK_IDLE_SECS", defaults.risk_idle_secs),
            disabled_idle_secs: env_u64("DISABLED_IDLE_SECS", defaults.disabled_idle_secs),
            reconnect_idle_secs: env_u64("RECONNECT_IDLE_SECS", defaults.reconnect_idle_secs),
        }
    }

    /// 校验启动所需的必填项。paper模式下不要求网关凭证
    pub fn validate(&self, paper: bool) -> Result<(), AppError> {
        if self.telegram_bot_token.is_empty() {
            return Err(AppError::Config("TELEGRAM_BOT_TOKEN is missing".to_string()));
        }
        if self.telegram_chat_id.is_empty() {
            return Err(AppError::Config("TELEGRAM_CHAT_ID is missing".to_string()));
        }
        if !paper {
            if self.bridge_url.is_none() {
                return Err(AppError::Config("MT5_BRIDGE_URL is missing".to_string()));
            }
            if self.bridge_api_key.is_none() || self.bridge_api_secret.is_none() {
                return Err(AppError::Config(
                    "MT5_BRIDGE_API_KEY/MT5_BRIDGE_API_SECRET is missing".to_string(),
                ));
            }
        }
        if self.symbol_list.is_empty() {
            return Err(AppError::Config("SYMBOL_LIST is empty".to_string()));
        }
        if self.ema_fast >= self.ema_slow {
            return Err(AppError::Config(
                "EMA_FAST must be smaller than EMA_SLOW".to_string(),
            ));
        }
        if self.session_start > self.session_end {
            return Err(AppError::Config(
                "session window must not wrap midnight".to_string(),
            ));
        }
        Ok(())
    }

    /// 品种的止损倍率，未配置时使用默认值
    pub fn sl_multiplier(&self, symbol: &str) -> f64 {
        self.sl_multiplier_overrides
            .get(symbol)
            .copied()
            .unwrap_or(self.sl_multiplier_default)
    }
}

fn parse_time_env(key: &str, default: NaiveTime) -> NaiveTime {
    match std::env::var(key) {
        Ok(v) => NaiveTime::parse_from_str(v.trim(), "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(v.trim(), "%H:%M:%S"))
            .unwrap_or(default),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid_for_paper() {
        let mut config = AppConfig::default();
        config.telegram_bot_token = "token".to_string();
        config.telegram_chat_id = "chat".to_string();
        assert!(config.validate(true).is_ok());
        // 实盘模式缺少网关配置应报错
        assert!(config.validate(false).is_err());
    }

    #[test]
    fn test_sl_multiplier_override() {
        let config = AppConfig::default();
        assert_eq!(config.sl_multiplier("GBPUSD"), 3.5);
        assert_eq!(config.sl_multiplier("EURUSD"), 2.0);
    }
}
