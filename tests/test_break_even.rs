use razgon_bot::job::break_even_job::{BreakEvenJob, PlanBook};
use razgon_bot::trading::venue::sim::SimVenue;
use razgon_bot::trading::venue::{InstrumentInfo, OrderSide, VenueApi, VenuePosition};

const OWNER_TAG: i64 = 234987;
const TICK: f64 = 0.00001;

fn instrument() -> InstrumentInfo {
    InstrumentInfo {
        symbol: "EURUSD".to_string(),
        tick_size: TICK,
        min_volume: 0.01,
        max_volume: 100.0,
        volume_step: 0.01,
        spread: 0.00012,
    }
}

fn buy_position(ticket: i64, current_price: f64) -> VenuePosition {
    VenuePosition {
        ticket,
        symbol: "EURUSD".to_string(),
        side: OrderSide::Buy,
        open_price: 1.1000,
        current_price,
        stop_loss: 1.0950,
        take_profit: 1.1070,
        volume: 0.01,
        owner_tag: OWNER_TAG,
    }
}

#[test]
fn test_break_even_triggers_above_forty_percent() {
    // 计划止盈距离0.0070，浮盈0.0030 > 40%阈值0.0028
    let position = buy_position(1, 1.1030);
    let new_sl = BreakEvenJob::break_even_stop(&position, None, TICK).unwrap();
    // 新止损 = 开仓价 + 10个步长
    assert!((new_sl - 1.1001).abs() < 1e-9);
    // 只朝减小风险的方向移动
    assert!(new_sl > position.stop_loss);
}

#[test]
fn test_break_even_not_triggered_below_threshold() {
    // 浮盈0.0020 < 0.0028，不动
    let position = buy_position(1, 1.1020);
    assert!(BreakEvenJob::break_even_stop(&position, None, TICK).is_none());
}

#[test]
fn test_break_even_idempotent_once_past_entry() {
    let mut position = buy_position(1, 1.1040);
    position.stop_loss = 1.1001;
    // 止损已过保本位，重复评估是空操作
    assert!(BreakEvenJob::break_even_stop(&position, None, TICK).is_none());
}

#[test]
fn test_break_even_sell_mirror() {
    let position = VenuePosition {
        ticket: 2,
        symbol: "EURUSD".to_string(),
        side: OrderSide::Sell,
        open_price: 1.1000,
        current_price: 1.0968,
        stop_loss: 1.1050,
        take_profit: 1.0930,
        volume: 0.01,
        owner_tag: OWNER_TAG,
    };
    let new_sl = BreakEvenJob::break_even_stop(&position, None, TICK).unwrap();
    assert!((new_sl - 1.0999).abs() < 1e-9);
    assert!(new_sl < position.stop_loss);
}

#[test]
fn test_break_even_without_take_profit_is_noop() {
    let mut position = buy_position(3, 1.1050);
    position.take_profit = 0.0;
    assert!(BreakEvenJob::break_even_stop(&position, None, TICK).is_none());
}

#[test]
fn test_snapshot_distance_survives_live_tp_change() {
    // 网关侧的止盈被外部改掉后，快照距离仍然有效
    let mut position = buy_position(4, 1.1030);
    position.take_profit = 0.0;
    let new_sl = BreakEvenJob::break_even_stop(&position, Some(0.0070), TICK).unwrap();
    assert!((new_sl - 1.1001).abs() < 1e-9);
}

#[tokio::test]
async fn test_break_even_job_adjusts_exactly_once() {
    let _ = env_logger::try_init();
    let venue = SimVenue::new(OWNER_TAG);
    venue.seed_instrument(instrument());
    venue.push_position(buy_position(10, 1.1030));

    let job = BreakEvenJob::new(OWNER_TAG);
    let mut plan_book = PlanBook::new();

    // 第一轮：移动一次，且新止损严格优于旧止损
    let adjusted = job.run(&venue, &mut plan_book).await.unwrap();
    assert_eq!(adjusted, 1);
    let positions = venue.positions_snapshot();
    assert!((positions[0].stop_loss - 1.1001).abs() < 1e-9);
    assert_eq!(venue.stops_modified(), 1);

    // 第二轮：同一持仓不再产生任何修改
    let adjusted = job.run(&venue, &mut plan_book).await.unwrap();
    assert_eq!(adjusted, 0);
    assert_eq!(venue.stops_modified(), 1);
}

#[tokio::test]
async fn test_break_even_ignores_foreign_positions() {
    let venue = SimVenue::new(OWNER_TAG);
    venue.seed_instrument(instrument());
    let mut foreign = buy_position(20, 1.1030);
    foreign.owner_tag = 111111;
    venue.push_position(foreign);

    let job = BreakEvenJob::new(OWNER_TAG);
    let mut plan_book = PlanBook::new();
    let adjusted = job.run(&venue, &mut plan_book).await.unwrap();
    assert_eq!(adjusted, 0);
    assert_eq!(venue.stops_modified(), 0);
}
