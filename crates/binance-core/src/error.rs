//! Error types for the futures trading tool.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// The exchange understood the request and declined it.
    #[error("Exchange error {code}: {message}")]
    Exchange { code: i64, message: String },

    /// Unclassified API failure; carries the original status and body.
    #[error("API error: {message}")]
    Api { message: String, status: Option<u16> },

    #[error("Signing error: {message}")]
    Signing { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
