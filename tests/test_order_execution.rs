use tokio::sync::Mutex;

use razgon_bot::app_config::settings::AppConfig;
use razgon_bot::job::break_even_job::PlanBook;
use razgon_bot::trading::order::SignalOrder;
use razgon_bot::trading::risk::risk_manager::RiskManager;
use razgon_bot::trading::strategy::strategy_common::SignalResult;
use razgon_bot::trading::venue::sim::SimVenue;
use razgon_bot::trading::venue::VenueApi;

const OWNER_TAG: i64 = 234987;

fn buy_signal() -> SignalResult {
    let mut signal = SignalResult::no_signal(1.1455, 17_940_000);
    signal.should_buy = true;
    signal.stop_loss = 1.1424;
    signal.take_profit = 1.1477;
    signal.sl_steps = 310.0;
    signal
}

async fn connected_venue() -> SimVenue {
    let venue = SimVenue::new(OWNER_TAG);
    venue.set_price("EURUSD", 1.1455);
    venue.connect().await.unwrap();
    venue
}

#[tokio::test]
async fn test_repeat_count_places_multiple_orders() {
    let venue = connected_venue().await;
    let risk_manager = Mutex::new(RiskManager::new(&AppConfig::default()));
    let plan_book = Mutex::new(PlanBook::new());

    let outcome = SignalOrder::execute(
        &venue,
        &risk_manager,
        &plan_book,
        "EURUSD",
        &buy_signal(),
        0.01,
        3,
    )
    .await
    .unwrap();

    // 同一信号按配置重复下三单，每单都计入当日交易数
    assert_eq!(outcome.placed, 3);
    assert_eq!(outcome.tickets.len(), 3);
    assert_eq!(venue.orders_placed(), 3);
    assert_eq!(risk_manager.lock().await.trades_today, 3);
    // 每张订单的计划止盈距离都已登记，供保本任务使用
    assert_eq!(plan_book.lock().await.len(), 3);
}

#[tokio::test]
async fn test_rejected_orders_do_not_count() {
    let venue = connected_venue().await;
    venue.set_reject_orders(true);
    let risk_manager = Mutex::new(RiskManager::new(&AppConfig::default()));
    let plan_book = Mutex::new(PlanBook::new());

    let outcome = SignalOrder::execute(
        &venue,
        &risk_manager,
        &plan_book,
        "EURUSD",
        &buy_signal(),
        0.01,
        3,
    )
    .await
    .unwrap();

    assert_eq!(outcome.placed, 0);
    assert_eq!(risk_manager.lock().await.trades_today, 0);
    assert!(plan_book.lock().await.is_empty());
}

#[tokio::test]
async fn test_execute_without_signal_is_an_error() {
    let venue = connected_venue().await;
    let risk_manager = Mutex::new(RiskManager::new(&AppConfig::default()));
    let plan_book = Mutex::new(PlanBook::new());

    let signal = SignalResult::no_signal(1.1455, 0);
    let result = SignalOrder::execute(
        &venue,
        &risk_manager,
        &plan_book,
        "EURUSD",
        &signal,
        0.01,
        3,
    )
    .await;
    assert!(result.is_err());
}
