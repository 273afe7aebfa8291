use std::sync::Arc;

use anyhow::anyhow;
use clap::Parser;
use dotenv::dotenv;
use tokio::sync::Mutex;
use tokio_cron_scheduler::JobScheduler;
use tracing::{error, info};

use razgon_bot::app_config::log::setup_logging;
use razgon_bot::app_config::settings::AppConfig;
use razgon_bot::error::app_error::AppError;
use razgon_bot::job::break_even_job::PlanBook;
use razgon_bot::job::daily_reset_job::DailyResetJob;
use razgon_bot::trading::risk::risk_manager::{FixedLotSizer, RiskManager};
use razgon_bot::trading::services::telegram_bot::TelegramBot;
use razgon_bot::trading::services::trading_switch::TradingSwitch;
use razgon_bot::trading::task::trading_loop::TradingLoop;
use razgon_bot::trading::venue::bridge::BridgeClient;
use razgon_bot::trading::venue::sim::SimVenue;
use razgon_bot::trading::venue::VenueApi;

#[derive(Parser, Debug)]
#[command(name = "razgon_bot", about = "MT5 trend-following trading bot")]
struct Args {
    /// 使用模拟盘网关，不连接真实MT5
    #[arg(long)]
    paper: bool,

    /// 覆盖配置中的品种列表，逗号分隔
    #[arg(long)]
    symbols: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    // 设置日志
    setup_logging().await?;

    let args = Args::parse();

    let mut config = AppConfig::from_env();
    if let Some(symbols) = &args.symbols {
        config.symbol_list = symbols
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
    }
    // 配置缺失是致命错误，进程不进入主循环
    config
        .validate(args.paper)
        .map_err(|e: AppError| anyhow!("startup aborted: {}", e))?;
    let config = Arc::new(config);

    let venue: Arc<dyn VenueApi> = if args.paper {
        info!("running in paper mode with simulated venue");
        Arc::new(SimVenue::new(config.owner_tag))
    } else {
        Arc::new(BridgeClient::from_config(&config).map_err(|e| anyhow!("{}", e))?)
    };

    // 开关初始为关闭，等待操作者 /on
    let switch = Arc::new(TradingSwitch::new(false));
    let risk_manager = Arc::new(Mutex::new(RiskManager::new(&config)));
    let plan_book = Arc::new(Mutex::new(PlanBook::new()));

    let bot = Arc::new(TelegramBot::new(
        Arc::clone(&config),
        Arc::clone(&switch),
        Arc::clone(&risk_manager),
        Arc::clone(&plan_book),
        Arc::clone(&venue),
    ));

    // 每日00:00 UTC重置风控计数
    let mut scheduler = JobScheduler::new()
        .await
        .map_err(|e| anyhow!("scheduler init failed: {}", e))?;
    DailyResetJob::register(&scheduler, Arc::clone(&venue), Arc::clone(&risk_manager)).await?;
    scheduler
        .start()
        .await
        .map_err(|e| anyhow!("scheduler start failed: {}", e))?;

    // Telegram监听独立于交易循环运行
    let bot_task = {
        let bot = Arc::clone(&bot);
        tokio::spawn(async move {
            if let Err(e) = bot.run().await {
                error!("telegram bot crashed: {}", e);
            }
        })
    };

    let lot_sizer = Box::new(FixedLotSizer {
        lot: config.fixed_lot,
    });
    let trading_loop = TradingLoop::new(
        Arc::clone(&config),
        Arc::clone(&venue),
        Arc::clone(&switch),
        Arc::clone(&risk_manager),
        Arc::clone(&plan_book),
        Arc::clone(&bot),
        lot_sizer,
    );
    let loop_task = tokio::spawn(async move {
        if let Err(e) = trading_loop.run().await {
            error!("trading loop crashed: {}", e);
        }
    });

    // 捕捉Ctrl+C信号以平滑关闭
    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    bot_task.abort();
    loop_task.abort();
    if let Err(e) = scheduler.shutdown().await {
        error!("scheduler shutdown failed: {}", e);
    }
    if let Err(e) = venue.disconnect().await {
        error!("venue disconnect failed: {}", e);
    }
    info!("bot stopped");
    Ok(())
}
