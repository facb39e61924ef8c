//! Binance USD-M Futures order placement CLI.
//!
//! Places exactly one market, limit, or stop-limit order and exits with a
//! status describing the outcome: 0 order accepted, 1 order rejected or
//! failed, 2 configuration or argument error.

use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use binance_core::api::TradingGateway;
use binance_core::audit::{AuditLog, RotatingWriter, DEFAULT_BACKUPS, DEFAULT_MAX_BYTES};
use binance_core::config::{Overrides, Settings};
use binance_core::types::{OrderIntent, OrderSide, TimeInForce};

const BOT_LOG_PATH: &str = "logs/bot.log";
const AUDIT_LOG_PATH: &str = "logs/requests.log";

const EXIT_ORDER_FAILED: u8 = 1;
const EXIT_USAGE: u8 = 2;

/// Order type as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
enum OrderKind {
    Market,
    Limit,
    StopLimit,
}

#[derive(Debug, Parser)]
#[command(
    name = "order-cli",
    about = "Binance USD-M Futures order placement tool",
    version
)]
struct Cli {
    /// Trading symbol, e.g. BTCUSDT.
    #[arg(long)]
    symbol: String,

    /// Order side: BUY or SELL (any casing).
    #[arg(long)]
    side: OrderSide,

    /// Order type.
    #[arg(long = "type", value_enum)]
    order_type: OrderKind,

    /// Order quantity (> 0).
    #[arg(long, value_parser = positive_decimal)]
    quantity: Decimal,

    /// Execution price for limit and stop-limit orders (> 0).
    #[arg(long, value_parser = positive_decimal)]
    price: Option<Decimal>,

    /// Trigger price for stop-limit orders (> 0).
    #[arg(long = "stop-price", value_parser = positive_decimal)]
    stop_price: Option<Decimal>,

    /// Time in force for limit and stop-limit orders.
    #[arg(long = "time-in-force", default_value = "GTC")]
    time_in_force: TimeInForce,

    /// API key (overrides BINANCE_API_KEY).
    #[arg(long = "api-key")]
    api_key: Option<String>,

    /// API secret (overrides BINANCE_API_SECRET).
    #[arg(long = "api-secret")]
    api_secret: Option<String>,

    /// Route order traffic to the futures testnet (default true).
    #[arg(long, action = clap::ArgAction::Set)]
    testnet: Option<bool>,
}

fn positive_decimal(value: &str) -> Result<Decimal, String> {
    let parsed: Decimal = value.parse().map_err(|_| "must be a number".to_string())?;
    if parsed <= Decimal::ZERO {
        return Err("must be > 0".to_string());
    }
    Ok(parsed)
}

/// Turn parsed arguments into a validated intent, rejecting combinations the
/// chosen order type cannot express. Runs before any exchange interaction.
fn build_intent(cli: &Cli) -> Result<OrderIntent, String> {
    if cli.symbol.trim().is_empty() {
        return Err("--symbol must not be empty".to_string());
    }

    match cli.order_type {
        OrderKind::Market => Ok(OrderIntent::market(&cli.symbol, cli.side, cli.quantity)),
        OrderKind::Limit => {
            let price = cli
                .price
                .ok_or_else(|| "--price is required for limit orders".to_string())?;
            Ok(OrderIntent::limit(
                &cli.symbol,
                cli.side,
                cli.quantity,
                price,
                cli.time_in_force,
            ))
        }
        OrderKind::StopLimit => {
            let (Some(price), Some(stop_price)) = (cli.price, cli.stop_price) else {
                return Err(
                    "--price and --stop-price are required for stop_limit orders".to_string()
                );
            };
            Ok(OrderIntent::stop_limit(
                &cli.symbol,
                cli.side,
                cli.quantity,
                price,
                stop_price,
                cli.time_in_force,
            ))
        }
    }
}

/// Console logging plus a rotating `logs/bot.log`, level from BOT_LOG_LEVEL.
fn init_logging() {
    let level = std::env::var("BOT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("order_cli={level},binance_core={level}").into());

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    match RotatingWriter::open(BOT_LOG_PATH, DEFAULT_MAX_BYTES, DEFAULT_BACKUPS) {
        Ok(writer) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(move || writer.clone()),
            )
            .init(),
        Err(e) => {
            registry.init();
            error!(error = %e, path = BOT_LOG_PATH, "Could not open log file, console only");
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let settings = match Settings::resolve(Overrides {
        api_key: cli.api_key.clone(),
        api_secret: cli.api_secret.clone(),
        testnet: cli.testnet,
    }) {
        Ok(settings) => settings,
        Err(e) => {
            error!("Config error: {e}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let intent = match build_intent(&cli) {
        Ok(intent) => intent,
        Err(message) => {
            error!("{message}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let audit = match AuditLog::rotating(AUDIT_LOG_PATH) {
        Ok(audit) => audit,
        Err(e) => {
            error!("Could not open audit log {AUDIT_LOG_PATH}: {e}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let gateway = match TradingGateway::new(&settings, audit) {
        Ok(gateway) => gateway,
        Err(e) => {
            error!("Config error: {e}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    info!(
        symbol = %intent.symbol(),
        order_type = ?cli.order_type,
        side = %cli.side,
        "Placing order"
    );

    let result = match intent {
        OrderIntent::Market {
            symbol,
            side,
            quantity,
        } => gateway.place_market_order(&symbol, side, quantity).await,
        OrderIntent::Limit {
            symbol,
            side,
            quantity,
            price,
            time_in_force,
        } => {
            gateway
                .place_limit_order(&symbol, side, quantity, price, time_in_force)
                .await
        }
        OrderIntent::StopLimit {
            symbol,
            side,
            quantity,
            price,
            stop_price,
            time_in_force,
        } => {
            gateway
                .place_stop_limit_order(&symbol, side, quantity, price, stop_price, time_in_force)
                .await
        }
    };

    if result.is_success() {
        let data = result.data().cloned().unwrap_or(serde_json::Value::Null);
        info!("Order placed successfully");
        println!("success {data}");
        ExitCode::SUCCESS
    } else {
        let message = result.error().unwrap_or("unknown error");
        error!("Order failed: {message}");
        println!("error {message}");
        ExitCode::from(EXIT_ORDER_FAILED)
    }
}
