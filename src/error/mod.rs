use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

mod utils;
pub use utils::*;

pub type Result<T> = std::result::Result<T, SwapError>;

/// Which side of a trade a token reference belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Sell,
    Buy,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Sell => write!(f, "sell"),
            TradeSide::Buy => write!(f, "buy"),
        }
    }
}

#[derive(Error, Debug)]
pub enum SwapError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Environment error: {0}")]
    Environment(String),

    #[error("{side} token not found: {reference}")]
    TokenNotFound { side: TradeSide, reference: String },

    #[error("Failed to decode account data at address {address}: {message}")]
    AccountDecode { address: String, message: String },

    #[error("Insufficient token data for mint {id}")]
    InsufficientTokenData { id: String },

    #[error("Solana RPC error: {0}")]
    SolanaRpc(String),

    #[error("Provider error: {0}")]
    Provider(NormalizedError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transaction decode error: {0}")]
    TransactionDecode(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl SwapError {
    /// True when the error already carries normalized provider context
    /// (status/code/url/raw), so normalization is never applied twice.
    pub fn is_normalized(&self) -> bool {
        matches!(self, SwapError::Provider(_))
    }

    /// Collapses the error into the uniform provider-error shape. Already
    /// normalized errors pass through untouched; transport errors keep their
    /// status and URL when known; everything else becomes a message with the
    /// original retained as an opaque payload.
    pub fn normalize(self) -> NormalizedError {
        match self {
            SwapError::Provider(normalized) => normalized,
            SwapError::HttpClient(e) => NormalizedError {
                message: e.to_string(),
                status: e.status().map(|s| s.as_u16()),
                code: None,
                url: e.url().map(|u| u.to_string()),
                raw: Some(format!("{e:?}")),
            },
            other => NormalizedError::from_message(other.to_string(), &other),
        }
    }

    /// HTTP-equivalent status the error maps to at the service boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            SwapError::TokenNotFound { .. } => 404,
            SwapError::Provider(normalized) => normalized.status.unwrap_or(500),
            _ => 500,
        }
    }

    /// Structured body reported to the caller. Only deliberately modeled
    /// business outcomes expose detail; everything else stays generic.
    pub fn to_body(&self) -> ErrorBody {
        match self {
            SwapError::TokenNotFound { .. } => ErrorBody {
                error_type: "TokenNotFound",
                description: self.to_string(),
            },
            _ => ErrorBody {
                error_type: "InternalError",
                description: "Internal Server Error".to_string(),
            },
        }
    }
}

/// Boundary-level error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    #[serde(rename = "errorType")]
    pub error_type: &'static str,
    pub description: String,
}

/// Uniform shape for heterogeneous provider failures.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NormalizedError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl fmt::Display for NormalizedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (HTTP {})", self.message, status),
            None => write!(f, "{}", self.message),
        }
    }
}

impl NormalizedError {
    /// Builds from an HTTP error response. The body is parsed as JSON when
    /// possible (`message`/`error` fields become the message, `errorCode`/
    /// `code` the code), falling back to the plain-text body, falling back
    /// to "HTTP <status>".
    pub fn from_response(status: u16, url: &str, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let (message, code) = match &parsed {
            Some(v) => (
                v.get("message")
                    .and_then(Value::as_str)
                    .or_else(|| v.get("error").and_then(Value::as_str))
                    .map(str::to_string),
                v.get("errorCode")
                    .or_else(|| v.get("code"))
                    .map(|c| match c {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    }),
            ),
            None => {
                let text = body.trim();
                (
                    if text.is_empty() {
                        None
                    } else {
                        Some(text.to_string())
                    },
                    None,
                )
            }
        };
        NormalizedError {
            message: message.unwrap_or_else(|| format!("HTTP {status}")),
            status: Some(status),
            code,
            url: Some(url.to_string()),
            raw: None,
        }
    }

    /// Builds from a plain error message, retaining the original value as an
    /// opaque payload.
    pub fn from_message(message: impl Into<String>, raw: &dyn fmt::Debug) -> Self {
        NormalizedError {
            message: message.into(),
            raw: Some(format!("{raw:?}")),
            ..Default::default()
        }
    }

    /// Generic marker for values that expose neither a response nor a
    /// message.
    pub fn unknown(raw: &dyn fmt::Debug) -> Self {
        NormalizedError {
            message: "unknown error".to_string(),
            raw: Some(format!("{raw:?}")),
            ..Default::default()
        }
    }
}
