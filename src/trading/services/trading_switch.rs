use std::sync::atomic::{AtomicBool, Ordering};

/// 全局交易开关
///
/// Telegram端写、交易循环读，因此用原子量而不是裸的全局变量。
/// 初始为关闭，等待操作者显式开启。
#[derive(Debug, Default)]
pub struct TradingSwitch {
    enabled: AtomicBool,
}

impl TradingSwitch {
    pub fn new(initial: bool) -> Self {
        Self {
            enabled: AtomicBool::new(initial),
        }
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_toggles() {
        let switch = TradingSwitch::new(false);
        assert!(!switch.is_enabled());
        switch.enable();
        assert!(switch.is_enabled());
        switch.disable();
        assert!(!switch.is_enabled());
    }
}
