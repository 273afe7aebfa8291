use thiserror::Error;

/// 应用错误
#[derive(Error, Debug)]
pub enum AppError {
    /// 配置缺失或非法，启动阶段即失败
    #[error("配置错误: {0}")]
    Config(String),

    /// 网关连接失败，属于瞬时错误，退避后重试
    #[error("连接错误: {0}")]
    Connectivity(String),

    /// 行情数据缺失，跳过该品种的本轮评估
    #[error("行情数据缺失: {0}")]
    DataUnavailable(String),

    /// K线数量不足以完成指标预热
    #[error("K线数量不足: 需要{required}根，实际{got}根")]
    InsufficientHistory { required: usize, got: usize },

    /// 网关拒绝下单或改单，本轮不重试
    #[error("订单被拒绝: {0}")]
    OrderRejected(String),

    /// 未知错误
    #[error("未知错误: {0}")]
    Unknown(String),
}

impl AppError {
    /// 是否属于可跳过的行情类错误
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            AppError::DataUnavailable(_) | AppError::InsufficientHistory { .. }
        )
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Connectivity(err.to_string())
    }
}
