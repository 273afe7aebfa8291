use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{debug, error, info};

use crate::app_config::settings::AppConfig;
use crate::error::app_error::AppError;
use crate::trading::venue::{
    AccountState, InstrumentInfo, OrderSide, OrderTicket, VenueApi, VenuePosition,
};
use crate::CandleItem;

/// 网关响应的统一包装
#[derive(Debug, Deserialize)]
struct BridgeResponse<T> {
    code: String,
    msg: String,
    data: Option<T>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BarDto {
    ts: i64,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    v: f64,
}

#[derive(Debug, Serialize)]
struct OrderReqDto<'a> {
    symbol: &'a str,
    side: String,
    volume: f64,
    stop_loss: f64,
    take_profit: f64,
    /// 客户端订单号，便于对账
    client_order_id: String,
    comment: &'a str,
    magic: i64,
}

#[derive(Debug, Serialize)]
struct ModifyReqDto {
    ticket: i64,
    stop_loss: f64,
    take_profit: f64,
}

/// MT5网关HTTP客户端，所有请求带HMAC-SHA256签名
pub struct BridgeClient {
    client: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
    owner_tag: i64,
}

impl BridgeClient {
    pub fn new(base_url: String, api_key: String, api_secret: String, owner_tag: i64) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
            api_secret,
            owner_tag,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let base_url = config
            .bridge_url
            .clone()
            .ok_or_else(|| AppError::Config("MT5_BRIDGE_URL is missing".to_string()))?;
        let api_key = config
            .bridge_api_key
            .clone()
            .ok_or_else(|| AppError::Config("MT5_BRIDGE_API_KEY is missing".to_string()))?;
        let api_secret = config
            .bridge_api_secret
            .clone()
            .ok_or_else(|| AppError::Config("MT5_BRIDGE_API_SECRET is missing".to_string()))?;
        Ok(Self::new(base_url, api_key, api_secret, config.owner_tag))
    }

    fn generate_signature(&self, timestamp: &str, method: &Method, path: &str, body: &str) -> String {
        let sign_payload = format!("{}{}{}{}", timestamp, method.as_str(), path, body);
        let mut hmac = Hmac::<Sha256>::new_from_slice(self.api_secret.as_bytes())
            .expect("hmac key of any length is accepted");
        hmac.update(sign_payload.as_bytes());
        base64::encode(hmac.finalize().into_bytes())
    }

    async fn send_request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &str,
    ) -> Result<T, AppError> {
        let timestamp = chrono::Utc::now()
            .format("%Y-%m-%dT%H:%M:%S.%3fZ")
            .to_string();
        let signature = self.generate_signature(&timestamp, &method, path, body);

        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .request(method, &url)
            .header("MT5-ACCESS-KEY", &self.api_key)
            .header("MT5-ACCESS-SIGN", signature)
            .header("MT5-ACCESS-TIMESTAMP", timestamp)
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await?;

        let status_code = response.status();
        let response_body = response.text().await?;
        debug!("path:{},bridge_response: {}", path, response_body);

        if status_code != StatusCode::OK {
            return Err(AppError::Connectivity(format!(
                "bridge http {}: {}",
                status_code, response_body
            )));
        }

        let result: BridgeResponse<T> = serde_json::from_str(&response_body)
            .map_err(|e| AppError::Unknown(format!("bridge response decode error: {}", e)))?;
        if result.code != "0" {
            return Err(AppError::Unknown(format!(
                "bridge error {}: {}",
                result.code, result.msg
            )));
        }
        result
            .data
            .ok_or_else(|| AppError::DataUnavailable(format!("empty data for {}", path)))
    }
}

#[async_trait]
impl VenueApi for BridgeClient {
    async fn connect(&self) -> Result<bool, AppError> {
        let connected: bool = self
            .send_request(Method::POST, "/api/v1/connect", "")
            .await?;
        if connected {
            info!("connected to mt5 bridge: {}", self.base_url);
        }
        Ok(connected)
    }

    async fn get_instrument_info(&self, symbol: &str) -> Result<InstrumentInfo, AppError> {
        let path = format!("/api/v1/instrument?symbol={}", symbol);
        self.send_request(Method::GET, &path, "").await
    }

    async fn get_bars(
        &self,
        symbol: &str,
        timeframe: &str,
        count: usize,
    ) -> Result<Vec<CandleItem>, AppError> {
        let path = format!(
            "/api/v1/bars?symbol={}&timeframe={}&count={}",
            symbol, timeframe, count
        );
        let bars: Vec<BarDto> = self.send_request(Method::GET, &path, "").await?;
        if bars.is_empty() {
            return Err(AppError::DataUnavailable(format!(
                "no bars for {} {}",
                symbol, timeframe
            )));
        }
        let mut candles = Vec::with_capacity(bars.len());
        for bar in bars {
            let candle = CandleItem::builder()
                .ts(bar.ts)
                .o(bar.o)
                .h(bar.h)
                .l(bar.l)
                .c(bar.c)
                .v(bar.v)
                .build()
                .map_err(|e| AppError::DataUnavailable(format!("bad bar for {}: {}", symbol, e)))?;
            candles.push(candle);
        }
        Ok(candles)
    }

    async fn get_account_state(&self) -> Result<AccountState, AppError> {
        self.send_request(Method::GET, "/api/v1/account", "").await
    }

    async fn get_open_positions(&self, owner_tag: i64) -> Result<Vec<VenuePosition>, AppError> {
        let path = format!("/api/v1/positions?magic={}", owner_tag);
        let positions: Vec<VenuePosition> = self.send_request(Method::GET, &path, "").await?;
        // 网关已按magic过滤，这里再过滤一次以防网关实现不一致
        Ok(positions
            .into_iter()
            .filter(|p| p.owner_tag == owner_tag)
            .collect())
    }

    async fn place_order(
        &self,
        symbol: &str,
        side: OrderSide,
        volume: f64,
        stop_loss: f64,
        take_profit: f64,
    ) -> Result<OrderTicket, AppError> {
        let req = OrderReqDto {
            symbol,
            side: side.to_string(),
            volume,
            stop_loss,
            take_profit,
            client_order_id: uuid::Uuid::new_v4().to_string(),
            comment: "RazgonBot",
            magic: self.owner_tag,
        };
        let body = serde_json::to_string(&req)
            .map_err(|e| AppError::Unknown(format!("order request encode error: {}", e)))?;
        // 网关侧的业务失败按拒单处理
        let ticket: OrderTicket = self
            .send_request(Method::POST, "/api/v1/order", &body)
            .await
            .map_err(|e| match e {
                AppError::Unknown(msg) => AppError::OrderRejected(msg),
                other => other,
            })?;
        info!(
            "order placed: {} {} {} @ {}, ticket={}",
            side, volume, symbol, ticket.price, ticket.ticket
        );
        Ok(ticket)
    }

    async fn modify_stop(
        &self,
        ticket: i64,
        stop_loss: f64,
        take_profit: f64,
    ) -> Result<bool, AppError> {
        let req = ModifyReqDto {
            ticket,
            stop_loss,
            take_profit,
        };
        let body = serde_json::to_string(&req)
            .map_err(|e| AppError::Unknown(format!("modify request encode error: {}", e)))?;
        let modified: bool = self
            .send_request(Method::POST, "/api/v1/modify", &body)
            .await
            .map_err(|e| match e {
                AppError::Unknown(msg) => AppError::OrderRejected(msg),
                other => other,
            })?;
        if !modified {
            error!("modify rejected for ticket {}", ticket);
        }
        Ok(modified)
    }

    async fn disconnect(&self) -> Result<(), AppError> {
        let _: bool = self
            .send_request(Method::POST, "/api/v1/disconnect", "")
            .await?;
        info!("mt5 bridge connection closed");
        Ok(())
    }
}
