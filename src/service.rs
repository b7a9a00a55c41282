use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::{Result, SwapError, TradeSide};
use crate::jupiter_client::{JupiterClient, MintInformation, SwapOutcome};
use crate::tokens::{curated_registry, resolve_token, TokenInfo, TokenLookupResult};

/// Inbound swap query. Token references may be symbols or mint addresses;
/// the amount is in human units of the sell token.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteQuery {
    pub user_address: String,
    pub sell_token: String,
    pub buy_token: String,
    pub amount: f64,
}

/// Post-resolution query: both sides are concrete mints and the amount is
/// in atomic units of the sell token. Only constructible once both sides
/// resolved to a single token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuoteQuery {
    pub user_address: String,
    pub input_mint: String,
    pub output_mint: String,
    pub amount: u64,
}

/// Ambiguous resolutions for one or both sides of a trade. A side that
/// resolved cleanly has an empty candidate list.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TokenCandidates {
    pub buy: Vec<MintInformation>,
    pub sell: Vec<MintInformation>,
}

/// Terminal outcome of a quote request.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum QuoteOutcome {
    /// Both sides resolved; the quote and unsigned swap transaction are
    /// ready.
    Executable(SwapOutcome),
    /// One or both token references need caller disambiguation. No provider
    /// calls were made.
    Candidates { candidates: TokenCandidates },
}

impl QuoteOutcome {
    /// HTTP-equivalent status: 200 executable, 300 ambiguous.
    pub fn status(&self) -> u16 {
        match self {
            QuoteOutcome::Executable(_) => 200,
            QuoteOutcome::Candidates { .. } => 300,
        }
    }
}

enum Refinement {
    Ready(ParsedQuoteQuery),
    Ambiguous(TokenCandidates),
}

/// Orchestrates one quote request: resolve both token references, then
/// quote and build the swap through Jupiter. Each run is independent and
/// stateless across calls.
pub struct SwapService {
    jupiter: JupiterClient,
    rpc_url: String,
    min_score: f64,
}

impl SwapService {
    pub fn new(jupiter: JupiterClient, rpc_url: impl Into<String>, min_score: f64) -> Self {
        SwapService {
            jupiter,
            rpc_url: rpc_url.into(),
            min_score,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        SwapService::new(
            JupiterClient::new(settings.jupiter_api_key.clone()),
            settings.rpc_url.clone(),
            settings.min_token_score,
        )
    }

    /// Runs the full request cycle. An unresolved side surfaces as
    /// `TokenNotFound`; an ambiguous one as a candidates outcome without
    /// touching the provider.
    pub async fn run(&self, query: &QuoteQuery) -> Result<QuoteOutcome> {
        match self.refine(query).await? {
            Refinement::Ready(parsed) => {
                let outcome = self.jupiter.swap_flow(&parsed).await?;
                Ok(QuoteOutcome::Executable(outcome))
            }
            Refinement::Ambiguous(candidates) => Ok(QuoteOutcome::Candidates { candidates }),
        }
    }

    /// Holdings snapshot for an address, passed through from the provider.
    pub async fn holdings(&self, user_address: &str) -> Result<serde_json::Value> {
        self.jupiter.get_holdings(user_address).await
    }

    /// Resolves both sides of the trade concurrently, then combines the two
    /// outcomes under deterministic precedence rules.
    async fn refine(&self, query: &QuoteQuery) -> Result<Refinement> {
        let registry = curated_registry();
        let (sell, buy) = tokio::join!(
            resolve_token(
                &query.sell_token,
                &self.rpc_url,
                &self.jupiter,
                registry,
                self.min_score,
            ),
            resolve_token(
                &query.buy_token,
                &self.rpc_url,
                &self.jupiter,
                registry,
                self.min_score,
            ),
        );
        // Sell-side failures win over buy-side ones.
        combine(query, sell?, buy?)
    }
}

/// Combines the two resolution outcomes. Precedence: sell-side NotFound,
/// then buy-side NotFound, then ambiguity on either side, then ready.
fn combine(
    query: &QuoteQuery,
    sell: TokenLookupResult,
    buy: TokenLookupResult,
) -> Result<Refinement> {
    if matches!(sell, TokenLookupResult::NotFound) {
        return Err(SwapError::TokenNotFound {
            side: TradeSide::Sell,
            reference: query.sell_token.clone(),
        });
    }
    if matches!(buy, TokenLookupResult::NotFound) {
        return Err(SwapError::TokenNotFound {
            side: TradeSide::Buy,
            reference: query.buy_token.clone(),
        });
    }

    match (sell, buy) {
        (TokenLookupResult::Resolved(sell), TokenLookupResult::Resolved(buy)) => {
            let parsed = build_parsed_query(query, &sell, &buy);
            debug!(
                input_mint = %parsed.input_mint,
                output_mint = %parsed.output_mint,
                amount = parsed.amount,
                "both sides resolved"
            );
            Ok(Refinement::Ready(parsed))
        }
        (sell, buy) => {
            let mut candidates = TokenCandidates::default();
            if let TokenLookupResult::Candidates(tokens) = sell {
                warn!(
                    reference = %query.sell_token,
                    count = tokens.len(),
                    "multiple candidates for sell token"
                );
                candidates.sell = tokens;
            }
            if let TokenLookupResult::Candidates(tokens) = buy {
                warn!(
                    reference = %query.buy_token,
                    count = tokens.len(),
                    "multiple candidates for buy token"
                );
                candidates.buy = tokens;
            }
            Ok(Refinement::Ambiguous(candidates))
        }
    }
}

fn build_parsed_query(query: &QuoteQuery, sell: &TokenInfo, buy: &TokenInfo) -> ParsedQuoteQuery {
    ParsedQuoteQuery {
        user_address: query.user_address.clone(),
        input_mint: sell.address.to_string(),
        output_mint: buy.address.to_string(),
        amount: to_atomic_amount(query.amount, sell.decimals),
    }
}

/// Converts a human-unit amount to atomic units: amount * 10^decimals,
/// truncated toward zero.
fn to_atomic_amount(amount: f64, decimals: u8) -> u64 {
    (amount * 10f64.powi(decimals as i32)) as u64
}
