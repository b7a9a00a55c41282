// Public modules that are part of the API
pub mod config;
pub mod error;
pub mod jupiter_client;
pub mod monitoring;
pub mod service;
pub mod tokens;

// Re-export common types
pub use error::{log_error, ErrorBody, NormalizedError, Result, SwapError, TradeSide};

pub use jupiter_client::{
    JupiterClient,
    MintInformation,
    QuoteRequest,
    QuoteResponse,
    SwapOutcome,
    SwapResponse,
    NATIVE_ASSET,
    WRAPPED_NATIVE,
};

pub use service::{
    ParsedQuoteQuery,
    QuoteOutcome,
    QuoteQuery,
    SwapService,
    TokenCandidates,
};

pub use tokens::{
    curated_registry,
    is_address,
    load_token_map,
    resolve_token,
    TokenInfo,
    TokenLookupResult,
    TokenMap,
};
