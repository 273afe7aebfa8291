/// Wilder平滑（RMA），平滑系数 alpha = 1/period
///
/// 与 pandas 的 ewm(com=period-1, adjust=False) 等价：
/// 首个值直接作为种子，之后按 prev + alpha * (value - prev) 递推。
#[derive(Debug, Clone)]
pub struct Rma {
    period: usize,
    current_value: Option<f64>,
    count: usize,
}

impl Rma {
    pub fn new(period: usize) -> Self {
        Rma {
            period: period.max(1),
            current_value: None,
            count: 0,
        }
    }

    pub fn next(&mut self, value: f64) -> f64 {
        self.count += 1;
        let new_value = match self.current_value {
            None => value,
            Some(prev) => {
                let alpha = 1.0 / self.period as f64;
                prev + alpha * (value - prev)
            }
        };
        self.current_value = Some(new_value);
        new_value
    }

    /// 是否已经积累了足够的数据
    pub fn is_ready(&self) -> bool {
        self.count >= self.period
    }

    pub fn reset(&mut self) {
        self.current_value = None;
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rma_seeded_by_first_value() {
        let mut rma = Rma::new(3);
        assert_relative_eq!(rma.next(9.0), 9.0);
        // 9 + (12 - 9) / 3 = 10
        assert_relative_eq!(rma.next(12.0), 10.0);
        // 10 + (16 - 10) / 3 = 12
        assert_relative_eq!(rma.next(16.0), 12.0);
        assert!(rma.is_ready());
    }
}
