use approx::assert_relative_eq;
use razgon_bot::trading::indicator::rma::Rma;

#[test]
fn test_rma_seed_and_recurrence() {
    // Wilder平滑：首值做种子，之后 prev + (x - prev) / period
    let mut rma = Rma::new(14);
    assert_relative_eq!(rma.next(1.4), 1.4);
    let expected = 1.4 + (2.8 - 1.4) / 14.0;
    assert_relative_eq!(rma.next(2.8), expected);
    assert!(!rma.is_ready());
}

#[test]
fn test_rma_ready_after_period() {
    let mut rma = Rma::new(5);
    for i in 0..4 {
        rma.next(i as f64);
        assert!(!rma.is_ready());
    }
    rma.next(4.0);
    assert!(rma.is_ready());
}

#[test]
fn test_rma_converges_to_constant_input() {
    let mut rma = Rma::new(3);
    for _ in 0..200 {
        rma.next(7.5);
    }
    assert_relative_eq!(rma.next(7.5), 7.5);
}
