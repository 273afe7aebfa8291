use crate::trading::indicator::rma::Rma;

/// RSI，涨跌幅分别做Wilder平滑
pub struct Rsi {
    prev_close: Option<f64>,
    avg_gain: Rma,
    avg_loss: Rma,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Rsi {
            prev_close: None,
            avg_gain: Rma::new(period),
            avg_loss: Rma::new(period),
        }
    }

    pub fn next(&mut self, close: f64) -> f64 {
        let value = match self.prev_close {
            None => 50.0,
            Some(prev) => {
                let delta = close - prev;
                let gain = delta.max(0.0);
                let loss = (-delta).max(0.0);
                let avg_gain = self.avg_gain.next(gain);
                let avg_loss = self.avg_loss.next(loss);
                if avg_loss == 0.0 {
                    // 纯上涨时饱和到100，避免除零
                    100.0
                } else {
                    let rs = avg_gain / avg_loss;
                    100.0 - 100.0 / (1.0 + rs)
                }
            }
        };
        self.prev_close = Some(close);
        value
    }

    pub fn is_ready(&self) -> bool {
        self.avg_gain.is_ready() && self.avg_loss.is_ready()
    }
}
