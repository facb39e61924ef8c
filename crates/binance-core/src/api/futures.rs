//! Binance USD-M Futures order gateway.
//!
//! [`FuturesHttpClient`] owns the authenticated HTTP connection and speaks
//! the exchange's signed-request wire format. [`TradingGateway`] sits above
//! it: one order per call, every outcome normalized into an [`OrderResult`],
//! and every request/response pair written to the audit trail before the
//! call returns.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, error, info};

use super::params::NewOrderParams;
use crate::audit::AuditLog;
use crate::config::Settings;
use crate::types::{OrderIntent, OrderResult, OrderSide, TimeInForce};
use crate::{Error, Result};

/// Binance USD-M Futures API base URL (mainnet).
pub const FUTURES_HTTP_URL: &str = "https://fapi.binance.com";

/// Binance USD-M Futures API base URL (testnet).
pub const FUTURES_TESTNET_HTTP_URL: &str = "https://testnet.binancefuture.com";

const ORDER_PATH: &str = "/fapi/v1/order";
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// API credentials used to sign order requests.
#[derive(Clone)]
pub struct Credential {
    api_key: String,
    api_secret: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

impl Credential {
    pub fn new(api_key: String, api_secret: String) -> Self {
        Self {
            api_key,
            api_secret,
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// HMAC-SHA256 signature over the query string, hex-encoded.
    pub fn sign(&self, query: &str) -> Result<String> {
        let mut mac =
            Hmac::<Sha256>::new_from_slice(self.api_secret.as_bytes()).map_err(|e| {
                Error::Signing {
                    message: format!("Failed to create HMAC: {e}"),
                }
            })?;
        mac.update(query.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

/// Structured error body returned by the exchange.
#[derive(Debug, Deserialize)]
struct ExchangeErrorBody {
    code: i64,
    msg: String,
}

fn parse_error_response(status: u16, body: &str) -> Error {
    if let Ok(err) = serde_json::from_str::<ExchangeErrorBody>(body) {
        return Error::Exchange {
            code: err.code,
            message: err.msg,
        };
    }
    Error::Api {
        message: format!("unexpected status {status}: {body}"),
        status: Some(status),
    }
}

/// Typed submission seam to the exchange's order-creation endpoint.
#[async_trait]
pub trait OrderApi: Send + Sync {
    /// Submit one order; returns the acknowledgment payload.
    async fn create_order(&self, params: &NewOrderParams) -> Result<serde_json::Value>;
}

/// Authenticated HTTP client for the futures order endpoint.
#[derive(Debug)]
pub struct FuturesHttpClient {
    http_client: reqwest::Client,
    base_url: String,
    credential: Credential,
    recv_window: Option<u64>,
}

impl FuturesHttpClient {
    /// Build the client from resolved settings.
    ///
    /// The base endpoint is a configuration value: an explicit override wins,
    /// otherwise the testnet flag selects between the two known hosts.
    pub fn new(settings: &Settings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;

        let base_url = settings.base_url.clone().unwrap_or_else(|| {
            if settings.testnet {
                FUTURES_TESTNET_HTTP_URL.to_string()
            } else {
                FUTURES_HTTP_URL.to_string()
            }
        });

        Ok(Self {
            http_client,
            base_url,
            credential: Credential::new(settings.api_key.clone(), settings.api_secret.clone()),
            recv_window: settings.recv_window,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn signed_query(&self, params: &NewOrderParams) -> Result<String> {
        let mut query = params.to_query()?;

        let timestamp = chrono::Utc::now().timestamp_millis();
        query.push_str(&format!("&timestamp={timestamp}"));
        if let Some(recv_window) = self.recv_window {
            query.push_str(&format!("&recvWindow={recv_window}"));
        }

        let signature = self.credential.sign(&query)?;
        query.push_str(&format!("&signature={signature}"));
        Ok(query)
    }
}

#[async_trait]
impl OrderApi for FuturesHttpClient {
    async fn create_order(&self, params: &NewOrderParams) -> Result<serde_json::Value> {
        let query = self.signed_query(params)?;
        let url = format!("{}{}?{}", self.base_url, ORDER_PATH, query);

        let response = self
            .http_client
            .post(&url)
            .header("X-MBX-APIKEY", self.credential.api_key())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(parse_error_response(status.as_u16(), &body));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Order gateway: builds, submits, audits, and normalizes exactly one order
/// per call.
pub struct TradingGateway {
    api: Arc<dyn OrderApi>,
    audit: AuditLog,
}

impl TradingGateway {
    /// Gateway over the real exchange transport.
    pub fn new(settings: &Settings, audit: AuditLog) -> Result<Self> {
        let api = FuturesHttpClient::new(settings)?;
        info!(
            testnet = settings.testnet,
            base_url = %api.base_url(),
            "Initialized trading gateway"
        );
        Ok(Self {
            api: Arc::new(api),
            audit,
        })
    }

    /// Gateway over an arbitrary transport (used by tests).
    pub fn with_api(api: Arc<dyn OrderApi>, audit: AuditLog) -> Self {
        Self { api, audit }
    }

    /// Submit one built parameter set.
    ///
    /// Never returns an error: exchange rejections and transport faults are
    /// both normalized into a failed [`OrderResult`]. The request and its
    /// response (or failure) are written to the audit trail before returning.
    pub async fn submit(&self, params: NewOrderParams) -> OrderResult {
        let request_payload =
            serde_json::to_value(&params).unwrap_or(serde_json::Value::Null);
        self.audit.record_request(ORDER_PATH, request_payload);
        debug!(symbol = %params.symbol, order_type = ?params.order_type, "REQUEST create_order");

        match self.api.create_order(&params).await {
            Ok(data) => {
                self.audit.record_response(ORDER_PATH, data.clone());
                info!(symbol = %params.symbol, "Order accepted by exchange");
                OrderResult::ok(data)
            }
            Err(e) => {
                let message = e.to_string();
                self.audit.record_failure(ORDER_PATH, &message);
                error!(symbol = %params.symbol, error = %message, "Order submission failed");
                OrderResult::err(message)
            }
        }
    }

    pub async fn place_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
    ) -> OrderResult {
        let intent = OrderIntent::market(symbol, side, quantity);
        self.submit(NewOrderParams::build(&intent)).await
    }

    pub async fn place_limit_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
        time_in_force: TimeInForce,
    ) -> OrderResult {
        let intent = OrderIntent::limit(symbol, side, quantity, price, time_in_force);
        self.submit(NewOrderParams::build(&intent)).await
    }

    pub async fn place_stop_limit_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
        stop_price: Decimal,
        time_in_force: TimeInForce,
    ) -> OrderResult {
        let intent =
            OrderIntent::stop_limit(symbol, side, quantity, price, stop_price, time_in_force);
        self.submit(NewOrderParams::build(&intent)).await
    }
}
