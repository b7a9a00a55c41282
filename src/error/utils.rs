use tracing::{error, warn};

use super::SwapError;

/// Logs an error with a severity matching its kind.
///
/// # Arguments
/// * `error` - The SwapError to log
/// * `context` - Additional context about where/how the error occurred
pub fn log_error(error: &SwapError, context: &str) {
    match error {
        SwapError::TokenNotFound { .. } => {
            warn!("{} - {}", context, error);
        }
        SwapError::Provider(normalized) => {
            if normalized.status.map_or(true, |s| s >= 500) {
                error!("{} - Provider error: {}", context, normalized);
            } else {
                warn!("{} - Provider error: {}", context, normalized);
            }
        }
        SwapError::HttpClient(e) => {
            warn!("{} - HTTP client error: {}", context, e);
        }
        SwapError::AccountDecode { .. } | SwapError::InsufficientTokenData { .. } => {
            error!("{} - {}", context, error);
        }
        _ => error!("{} - {}", context, error),
    }
}
