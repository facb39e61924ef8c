//! Exchange API surface: request parameter construction and the order gateway.

pub mod futures;
pub mod params;

pub use futures::{FuturesHttpClient, OrderApi, TradingGateway};
pub use params::NewOrderParams;
