//! Integration tests for order placement through the public gateway surface.
//!
//! A stub transport stands in for the exchange so every scenario runs
//! offline; the audit trail is inspected through the in-memory sink.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;

use binance_core::api::{NewOrderParams, OrderApi, TradingGateway};
use binance_core::audit::{AuditKind, AuditLog, MemoryAuditSink};
use binance_core::types::{OrderSide, TimeInForce};
use binance_core::{Error, Result};

/// Stub exchange that records the parameter sets it receives.
struct StubExchange {
    received: Mutex<Vec<NewOrderParams>>,
    outcome: fn() -> Result<serde_json::Value>,
}

impl StubExchange {
    fn new(outcome: fn() -> Result<serde_json::Value>) -> Arc<Self> {
        Arc::new(Self {
            received: Mutex::new(Vec::new()),
            outcome,
        })
    }

    fn received(&self) -> Vec<NewOrderParams> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderApi for StubExchange {
    async fn create_order(&self, params: &NewOrderParams) -> Result<serde_json::Value> {
        self.received.lock().unwrap().push(params.clone());
        (self.outcome)()
    }
}

fn gateway_over(exchange: Arc<StubExchange>) -> (TradingGateway, Arc<MemoryAuditSink>) {
    let sink = Arc::new(MemoryAuditSink::new());
    let gateway = TradingGateway::with_api(exchange, AuditLog::new(sink.clone()));
    (gateway, sink)
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

#[tokio::test]
async fn market_order_round_trip() {
    let exchange =
        StubExchange::new(|| Ok(serde_json::json!({"orderId": 1, "status": "FILLED"})));
    let (gateway, _sink) = gateway_over(exchange.clone());

    let result = gateway
        .place_market_order("btcusdt", "buy".parse().unwrap(), dec("0.01"))
        .await;

    assert!(result.is_success());
    assert_eq!(
        result.data(),
        Some(&serde_json::json!({"orderId": 1, "status": "FILLED"}))
    );
    assert!(result.error().is_none());

    let sent = exchange.received();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].symbol, "BTCUSDT");
    assert_eq!(
        sent[0].to_query().unwrap(),
        "symbol=BTCUSDT&side=BUY&type=MARKET&quantity=0.01"
    );
}

#[tokio::test]
async fn limit_order_carries_default_time_in_force() {
    let exchange = StubExchange::new(|| Ok(serde_json::json!({"orderId": 2})));
    let (gateway, _sink) = gateway_over(exchange.clone());

    gateway
        .place_limit_order(
            "ETHUSDT",
            OrderSide::Sell,
            dec("1"),
            dec("2000"),
            TimeInForce::default(),
        )
        .await;

    let query = exchange.received()[0].to_query().unwrap();
    assert!(query.contains("timeInForce=GTC"));
    assert!(query.contains("price=2000"));
}

#[tokio::test]
async fn stop_limit_order_sends_the_exact_contract_set() {
    let exchange = StubExchange::new(|| Ok(serde_json::json!({"orderId": 3})));
    let (gateway, _sink) = gateway_over(exchange.clone());

    gateway
        .place_stop_limit_order(
            "BTCUSDT",
            OrderSide::Sell,
            dec("0.5"),
            dec("29000"),
            dec("29500"),
            TimeInForce::Gtc,
        )
        .await;

    assert_eq!(
        exchange.received()[0].to_query().unwrap(),
        "symbol=BTCUSDT&side=SELL&type=STOP&timeInForce=GTC&quantity=0.5&price=29000&stopPrice=29500"
    );
}

#[tokio::test]
async fn authentication_fault_becomes_a_failed_result() {
    let exchange = StubExchange::new(|| {
        Err(Error::Exchange {
            code: -2015,
            message: "Invalid API-key, IP, or permissions for action.".to_string(),
        })
    });
    let (gateway, sink) = gateway_over(exchange);

    let result = gateway
        .place_market_order("BTCUSDT", OrderSide::Buy, dec("0.01"))
        .await;

    assert!(!result.is_success());
    assert!(result.data().is_none());
    assert!(result
        .error()
        .unwrap()
        .contains("Invalid API-key, IP, or permissions"));

    // Both sides of the exchange interaction are on the audit trail.
    let records = sink.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].kind, AuditKind::Request);
    assert_eq!(records[1].kind, AuditKind::Response);
    assert!(!records[1].success);
}

#[tokio::test]
async fn sequential_submissions_are_audited_independently() {
    let exchange = StubExchange::new(|| Ok(serde_json::json!({"orderId": 4})));
    let (gateway, sink) = gateway_over(exchange.clone());

    for _ in 0..3 {
        let result = gateway
            .place_market_order("BTCUSDT", OrderSide::Buy, dec("0.01"))
            .await;
        assert!(result.is_success());
    }

    assert_eq!(exchange.received().len(), 3);
    assert_eq!(sink.records().len(), 6);
}
