use crate::trading::indicator::rma::Rma;

/// ATR，真实波幅经Wilder平滑
pub struct Atr {
    period: usize,
    prev_close: Option<f64>,
    rma: Rma,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Atr {
            period,
            prev_close: None,
            rma: Rma::new(period),
        }
    }

    fn true_range(&self, high: f64, low: f64) -> f64 {
        match self.prev_close {
            Some(prev_close) => {
                let range1 = high - low;
                let range2 = (high - prev_close).abs();
                let range3 = (low - prev_close).abs();
                range1.max(range2).max(range3)
            }
            // 首根K线没有前收盘价，退化为高低差
            None => high - low,
        }
    }

    pub fn next(&mut self, high: f64, low: f64, close: f64) -> f64 {
        let tr = self.true_range(high, low);
        let atr = self.rma.next(tr);
        self.prev_close = Some(close);
        atr
    }

    pub fn is_ready(&self) -> bool {
        self.rma.is_ready()
    }

    /// 重置计算器状态
    pub fn reset(&mut self) {
        self.prev_close = None;
        self.rma = Rma::new(self.period);
    }
}
