pub mod telegram_bot;
pub mod trading_switch;
