use chrono::NaiveTime;
use float_cmp::approx_eq;
use razgon_bot::app_config::settings::AppConfig;
use razgon_bot::trading::risk::risk_manager::{
    calculate_lot_size, normalize_volume, FixedLotSizer, LotSizer, RiskManager, RiskPercentLotSizer,
    RiskReason,
};
use razgon_bot::trading::venue::InstrumentInfo;

fn instrument() -> InstrumentInfo {
    InstrumentInfo {
        symbol: "EURUSD".to_string(),
        tick_size: 0.00001,
        min_volume: 0.01,
        max_volume: 100.0,
        volume_step: 0.01,
        spread: 0.00012,
    }
}

fn manager() -> RiskManager {
    RiskManager::new(&AppConfig::default())
}

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

#[test]
fn test_outside_session_blocks_regardless_of_other_state() {
    let mut risk = manager();
    risk.set_daily_start_balance(10000.0);

    // 清晨时段：即使回撤和交易数都健康也不放行
    let (allowed, reason) = risk.can_trade(t(7, 59), 10000.0);
    assert!(!allowed);
    assert_eq!(reason, RiskReason::OutsideSession);

    // 深夜同理
    let (allowed, reason) = risk.can_trade(t(23, 30), 10000.0);
    assert!(!allowed);
    assert_eq!(reason, RiskReason::OutsideSession);
}

#[test]
fn test_session_window_is_inclusive() {
    let mut risk = manager();
    risk.set_daily_start_balance(10000.0);
    assert!(risk.can_trade(t(8, 0), 10000.0).0);
    assert!(risk.can_trade(t(22, 0), 10000.0).0);
}

#[test]
fn test_daily_drawdown_limit() {
    let mut risk = manager();
    risk.set_daily_start_balance(10000.0);

    // 亏损10% >= 5% 上限，闸门关闭
    let (allowed, reason) = risk.can_trade(t(12, 0), 9000.0);
    assert!(!allowed);
    assert_eq!(reason, RiskReason::DailyDrawdown);

    // 亏损2% < 5%，放行
    let (allowed, reason) = risk.can_trade(t(12, 0), 9800.0);
    assert!(allowed);
    assert_eq!(reason, RiskReason::Ok);
}

#[test]
fn test_trade_count_cap() {
    let mut risk = manager();
    risk.set_daily_start_balance(10000.0);
    for _ in 0..15 {
        risk.record_trade();
    }
    let (allowed, reason) = risk.can_trade(t(12, 0), 10000.0);
    assert!(!allowed);
    assert_eq!(reason, RiskReason::MaxTradesReached);

    // 新交易日重置后恢复
    risk.reset_daily(10000.0);
    assert!(risk.can_trade(t(12, 0), 10000.0).0);
    assert_eq!(risk.trades_today, 0);
}

struct EchoSizer {
    lot: f64,
}

impl LotSizer for EchoSizer {
    fn raw_lot_size(&self, _instrument: &InstrumentInfo, _sl_steps: f64) -> f64 {
        self.lot
    }
}

#[test]
fn test_lot_size_always_inside_contract_bounds() {
    let instrument = instrument();
    // 任意原始手数，结果都要落在[min,max]内且是step的整数倍
    for raw in [
        -5.0,
        0.0,
        0.003,
        0.01,
        0.074,
        1.23456,
        99.999,
        1e9,
        f64::NAN,
        f64::INFINITY,
    ] {
        let sizer = EchoSizer { lot: raw };
        let volume = calculate_lot_size(&sizer, &instrument, 120.0);
        assert!(volume > 0.0, "raw {} produced non-positive {}", raw, volume);
        assert!(
            (instrument.min_volume..=instrument.max_volume).contains(&volume),
            "raw {} produced out-of-bounds {}",
            raw,
            volume
        );
        let steps = volume / instrument.volume_step;
        assert!(
            (steps - steps.round()).abs() < 1e-6,
            "raw {} produced non-step volume {}",
            raw,
            volume
        );
    }
}

#[test]
fn test_lot_size_steps_down_not_up() {
    let instrument = instrument();
    // 0.074手向下取整到0.07，而不是四舍五入到0.08
    assert!(approx_eq!(
        f64,
        normalize_volume(&instrument, 0.074),
        0.07,
        epsilon = 1e-9
    ));
}

#[test]
fn test_fixed_lot_sizer_default() {
    let instrument = instrument();
    let sizer = FixedLotSizer { lot: 0.01 };
    assert!((calculate_lot_size(&sizer, &instrument, 50.0) - 0.01).abs() < 1e-9);
}

#[test]
fn test_risk_percent_sizer_scales_with_stop_distance() {
    let instrument = instrument();
    let sizer = RiskPercentLotSizer {
        risk_percent: 2.0,
        balance: 10000.0,
        step_value_per_lot: 1.0,
    };
    // 风险额200，止损100步 -> 2手
    assert!((calculate_lot_size(&sizer, &instrument, 100.0) - 2.0).abs() < 1e-9);
    // 止损加倍，手数减半
    assert!((calculate_lot_size(&sizer, &instrument, 200.0) - 1.0).abs() < 1e-9);
    // 止损距离为零时退回到最小手数，不会出现非正手数
    assert!((calculate_lot_size(&sizer, &instrument, 0.0) - instrument.min_volume).abs() < 1e-9);
}
