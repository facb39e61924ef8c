//! Order request parameter construction.
//!
//! Pure translation from a trading intent to the parameter set of the
//! exchange's order-creation endpoint. No network access, no hidden state;
//! one parameter set per intent, used once.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{FuturesOrderType, OrderIntent, OrderSide, TimeInForce};
use crate::{Error, Result};

/// Parameter set for `POST /fapi/v1/order`, fully determined by one intent.
///
/// Optional fields are skipped during serialization so each order type
/// serializes exactly its contract set and nothing else.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewOrderParams {
    pub symbol: String,
    pub side: OrderSide,
    #[serde(rename = "type")]
    pub order_type: FuturesOrderType,
    #[serde(rename = "timeInForce", skip_serializing_if = "Option::is_none")]
    pub time_in_force: Option<TimeInForce>,
    pub quantity: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(rename = "stopPrice", skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<Decimal>,
}

impl NewOrderParams {
    /// Derive the request parameters for an intent.
    ///
    /// Total over pre-validated intents: every variant maps to exactly one
    /// parameter set. Stop-limit maps to type `STOP` with both `price` and
    /// `stopPrice`; `STOP_MARKET` (no execution price) is a different order
    /// type and is never produced here.
    pub fn build(intent: &OrderIntent) -> Self {
        match intent {
            OrderIntent::Market {
                symbol,
                side,
                quantity,
            } => Self {
                symbol: symbol.clone(),
                side: *side,
                order_type: FuturesOrderType::Market,
                time_in_force: None,
                quantity: *quantity,
                price: None,
                stop_price: None,
            },
            OrderIntent::Limit {
                symbol,
                side,
                quantity,
                price,
                time_in_force,
            } => Self {
                symbol: symbol.clone(),
                side: *side,
                order_type: FuturesOrderType::Limit,
                time_in_force: Some(*time_in_force),
                quantity: *quantity,
                price: Some(*price),
                stop_price: None,
            },
            OrderIntent::StopLimit {
                symbol,
                side,
                quantity,
                price,
                stop_price,
                time_in_force,
            } => Self {
                symbol: symbol.clone(),
                side: *side,
                order_type: FuturesOrderType::Stop,
                time_in_force: Some(*time_in_force),
                quantity: *quantity,
                price: Some(*price),
                stop_price: Some(*stop_price),
            },
        }
    }

    /// Serialize as the URL-encoded query string the exchange expects.
    pub fn to_query(&self) -> Result<String> {
        serde_urlencoded::to_string(self).map_err(|e| Error::Validation {
            message: e.to_string(),
        })
    }
}
