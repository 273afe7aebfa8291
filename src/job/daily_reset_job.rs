// 每日风控重置任务

use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::trading::risk::risk_manager::RiskManager;
use crate::trading::venue::VenueApi;

/// 每日00:00 UTC清空交易计数并重设回撤基准
pub struct DailyResetJob;

impl DailyResetJob {
    pub async fn register(
        scheduler: &JobScheduler,
        venue: Arc<dyn VenueApi>,
        risk_manager: Arc<Mutex<RiskManager>>,
    ) -> Result<()> {
        // cron按UTC解析：秒 分 时 日 月 周
        let job = Job::new_async("0 0 0 * * *", move |_uuid, _lock| {
            let venue = Arc::clone(&venue);
            let risk_manager = Arc::clone(&risk_manager);
            Box::pin(async move {
                match venue.get_account_state().await {
                    Ok(account) => {
                        let mut risk = risk_manager.lock().await;
                        risk.reset_daily(account.balance);
                        info!(
                            "daily risk reset done, start balance={:.2}",
                            account.balance
                        );
                    }
                    Err(e) => {
                        // 下一次成功连接时会重新设定基准
                        error!("daily risk reset skipped, account unavailable: {}", e);
                    }
                }
            })
        })
        .map_err(|e| anyhow!("create daily reset job failed: {}", e))?;
        scheduler
            .add(job)
            .await
            .map_err(|e| anyhow!("register daily reset job failed: {}", e))?;
        Ok(())
    }
}
