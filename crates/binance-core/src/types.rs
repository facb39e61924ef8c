//! Order types shared by the request builder, gateway, and CLI.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Side of the order (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderSide {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "BUY" => Ok(Self::Buy),
            "SELL" => Ok(Self::Sell),
            other => Err(Error::Validation {
                message: format!("invalid order side: {other} (expected BUY or SELL)"),
            }),
        }
    }
}

/// Order lifetime policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeInForce {
    /// Good-til-canceled.
    #[default]
    Gtc,
    /// Immediate-or-cancel.
    Ioc,
    /// Fill-or-kill.
    Fok,
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Gtc => "GTC",
            Self::Ioc => "IOC",
            Self::Fok => "FOK",
        };
        f.write_str(s)
    }
}

impl FromStr for TimeInForce {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GTC" => Ok(Self::Gtc),
            "IOC" => Ok(Self::Ioc),
            "FOK" => Ok(Self::Fok),
            other => Err(Error::Validation {
                message: format!("invalid time-in-force: {other} (expected GTC, IOC, or FOK)"),
            }),
        }
    }
}

/// Futures order type as the exchange names it.
///
/// A stop order with a limit execution price is `STOP` (carrying both `price`
/// and `stopPrice`), not `STOP_MARKET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FuturesOrderType {
    Market,
    Limit,
    Stop,
}

/// A validated trading intent, one variant per supported order type.
///
/// Constructors normalize the symbol to uppercase. Field invariants
/// (quantity > 0, prices > 0, non-empty symbol) are the caller's
/// responsibility and are checked by the CLI before an intent is built.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderIntent {
    Market {
        symbol: String,
        side: OrderSide,
        quantity: Decimal,
    },
    Limit {
        symbol: String,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
        time_in_force: TimeInForce,
    },
    StopLimit {
        symbol: String,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
        stop_price: Decimal,
        time_in_force: TimeInForce,
    },
}

impl OrderIntent {
    pub fn market(symbol: &str, side: OrderSide, quantity: Decimal) -> Self {
        Self::Market {
            symbol: symbol.to_uppercase(),
            side,
            quantity,
        }
    }

    pub fn limit(
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
        time_in_force: TimeInForce,
    ) -> Self {
        Self::Limit {
            symbol: symbol.to_uppercase(),
            side,
            quantity,
            price,
            time_in_force,
        }
    }

    pub fn stop_limit(
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
        stop_price: Decimal,
        time_in_force: TimeInForce,
    ) -> Self {
        Self::StopLimit {
            symbol: symbol.to_uppercase(),
            side,
            quantity,
            price,
            stop_price,
            time_in_force,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Self::Market { symbol, .. }
            | Self::Limit { symbol, .. }
            | Self::StopLimit { symbol, .. } => symbol,
        }
    }
}

/// Uniform outcome of one order submission.
///
/// Exactly one of the two shapes ever exists: an acknowledgment payload with
/// no error, or an error message with no payload. The constructors are the
/// only way to build one.
#[derive(Debug, Clone, Serialize)]
pub struct OrderResult {
    success: bool,
    data: Option<serde_json::Value>,
    error: Option<String>,
}

impl OrderResult {
    /// Successful exchange acknowledgment.
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Normalized failure (exchange rejection or transport fault).
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&serde_json::Value> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
