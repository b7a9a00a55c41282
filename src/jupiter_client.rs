use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use solana_sdk::transaction::VersionedTransaction;
use tracing::{debug, info};

use crate::error::{NormalizedError, Result, SwapError};
use crate::service::ParsedQuoteQuery;

/// Native SOL sentinel some callers pass as a mint. Jupiter only quotes
/// between fungible mints, so this gets substituted with wrapped SOL and
/// the swap is asked to wrap/unwrap around the trade.
pub const NATIVE_ASSET: &str = "So11111111111111111111111111111111111111111";
/// Canonical wrapped SOL mint.
pub const WRAPPED_NATIVE: &str = "So11111111111111111111111111111111111111112";

const API_URL: &str = "https://api.jup.ag";
const LITE_API_URL: &str = "https://lite-api.jup.ag";

/// Priority-fee ceiling attached to every swap request: 0.01 SOL at the
/// "high" tier. Policy constant, not caller-configurable.
const MAX_PRIORITY_FEE_LAMPORTS: u64 = 10_000_000;

/// Upper bound on any single provider call, so a hung request cannot block
/// the whole flow indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Token descriptor returned by Jupiter token search. Only the fields this
/// crate reads are typed; everything else rides along in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintInformation {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organic_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organic_score_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usd_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl MintInformation {
    /// Organic score, treating a missing score as zero.
    pub fn score(&self) -> f64 {
        self.organic_score.unwrap_or(0.0)
    }
}

/// Parameters for a quote request. Mints here may still be the native
/// sentinel; substitution happens inside `get_quote`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub input_mint: String,
    pub output_mint: String,
    pub amount: u64,
}

/// Jupiter quote, passed through to the swap call unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub input_mint: String,
    pub in_amount: String,
    pub output_mint: String,
    pub out_amount: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SwapRequest<'a> {
    user_public_key: &'a str,
    wrap_and_unwrap_sol: bool,
    dynamic_compute_unit_limit: bool,
    dynamic_slippage: bool,
    prioritization_fee_lamports: PrioritizationFee,
    quote_response: &'a QuoteResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrioritizationFee {
    priority_level_with_max_lamports: PriorityLevelWithMaxLamports,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PriorityLevelWithMaxLamports {
    max_lamports: u64,
    priority_level: &'static str,
}

/// Unsigned swap transaction plus provider metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResponse {
    pub swap_transaction: String,
    #[serde(default)]
    pub last_valid_block_height: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl SwapResponse {
    /// Decodes the unsigned transaction payload for inspection. This crate
    /// never signs or sends it.
    pub fn decode_transaction(&self) -> Result<VersionedTransaction> {
        let bytes = BASE64_STANDARD
            .decode(&self.swap_transaction)
            .map_err(|e| SwapError::TransactionDecode(format!("invalid base64: {e}")))?;
        bincode::deserialize(&bytes)
            .map_err(|e| SwapError::TransactionDecode(format!("invalid transaction bytes: {e}")))
    }
}

/// Quote plus the unsigned swap transaction built from it.
#[derive(Debug, Clone, Serialize)]
pub struct SwapOutcome {
    pub quote: QuoteResponse,
    #[serde(rename = "swapResponse")]
    pub swap_response: SwapResponse,
}

/// Replaces native SOL sentinels with the wrapped SOL mint, returning the
/// provider-safe request and whether the swap must wrap/unwrap SOL. The
/// caller's request is left untouched.
pub fn substitute_native(request: &QuoteRequest) -> (QuoteRequest, bool) {
    let mut substituted = request.clone();
    let native_sell = substituted.input_mint == NATIVE_ASSET;
    if native_sell {
        substituted.input_mint = WRAPPED_NATIVE.to_string();
    }
    let native_buy = substituted.output_mint == NATIVE_ASSET;
    if native_buy {
        substituted.output_mint = WRAPPED_NATIVE.to_string();
    }
    (substituted, native_sell || native_buy)
}

/// Score filter with an exact-symbol escape hatch: a match whose symbol
/// equals the query (case-insensitive) is admitted at half the threshold,
/// which keeps well-known tickers that a strict numeric cut would drop
/// alongside noisier near-duplicates.
pub fn score_filter(info: &MintInformation, query: &str, min_score: f64) -> bool {
    if info.score() >= min_score {
        return true;
    }
    let exact_symbol = info
        .symbol
        .as_deref()
        .is_some_and(|s| s.eq_ignore_ascii_case(query));
    exact_symbol && info.score() >= min_score / 2.0
}

/// Thin stateful wrapper around the Jupiter swap/search/holdings APIs,
/// bound once to optional API credentials.
#[derive(Clone)]
pub struct JupiterClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl JupiterClient {
    /// Creates a client. With an API key the paid endpoint is used,
    /// otherwise the free tier.
    pub fn new(api_key: Option<String>) -> Self {
        let base_url = if api_key.is_some() {
            API_URL
        } else {
            LITE_API_URL
        };
        info!(endpoint = base_url, "using Jupiter API endpoint");
        JupiterClient {
            http: reqwest::Client::new(),
            base_url: base_url.to_string(),
            api_key,
        }
    }

    /// Fetches a quote. Native sentinels are substituted for the provider
    /// call; the returned flag tells the swap step to wrap and unwrap SOL.
    pub async fn get_quote(&self, request: &QuoteRequest) -> Result<(QuoteResponse, bool)> {
        let (request, wrap_and_unwrap_sol) = substitute_native(request);
        let amount = request.amount.to_string();
        let url = format!("{}/swap/v1/quote", self.base_url);
        let response = self
            .send(self.http.get(&url).query(&[
                ("inputMint", request.input_mint.as_str()),
                ("outputMint", request.output_mint.as_str()),
                ("amount", amount.as_str()),
            ]))
            .await?;
        Ok((response.json::<QuoteResponse>().await?, wrap_and_unwrap_sol))
    }

    /// Builds the unsigned swap transaction for a quote. Execution hints are
    /// fixed: dynamic compute-unit limit, dynamic slippage, and the
    /// priority-fee ceiling.
    pub async fn get_swap(
        &self,
        user_public_key: &str,
        quote: &QuoteResponse,
        wrap_and_unwrap_sol: bool,
    ) -> Result<SwapResponse> {
        let request = SwapRequest {
            user_public_key,
            wrap_and_unwrap_sol,
            dynamic_compute_unit_limit: true,
            dynamic_slippage: true,
            prioritization_fee_lamports: PrioritizationFee {
                priority_level_with_max_lamports: PriorityLevelWithMaxLamports {
                    max_lamports: MAX_PRIORITY_FEE_LAMPORTS,
                    priority_level: "high",
                },
            },
            quote_response: quote,
        };
        debug!(user = user_public_key, "requesting swap transaction");
        let url = format!("{}/swap/v1/swap", self.base_url);
        let response = self.send(self.http.post(&url).json(&request)).await?;
        Ok(response.json().await?)
    }

    /// Quote then swap, in sequence. The swap is only attempted once a quote
    /// is in hand; a provider failure at either step aborts the flow.
    pub async fn swap_flow(&self, query: &ParsedQuoteQuery) -> Result<SwapOutcome> {
        let request = QuoteRequest {
            input_mint: query.input_mint.clone(),
            output_mint: query.output_mint.clone(),
            amount: query.amount,
        };
        let (quote, wrap_and_unwrap_sol) = self.get_quote(&request).await?;
        debug!(
            in_amount = %quote.in_amount,
            out_amount = %quote.out_amount,
            "received quote"
        );
        let swap_response = self
            .get_swap(&query.user_address, &quote, wrap_and_unwrap_sol)
            .await?;
        Ok(SwapOutcome {
            quote,
            swap_response,
        })
    }

    /// Searches Jupiter for tokens matching free text, filtered by organic
    /// score with the exact-symbol escape hatch.
    pub async fn search_token(&self, query: &str, min_score: f64) -> Result<Vec<MintInformation>> {
        let url = format!("{}/tokens/v2/search", self.base_url);
        let response = self.send(self.http.get(&url).query(&[("query", query)])).await?;
        let matches: Vec<MintInformation> = response.json().await?;
        debug!(query, hits = matches.len(), "token search returned");
        Ok(matches
            .into_iter()
            .filter(|m| score_filter(m, query, min_score))
            .collect())
    }

    /// Account holdings snapshot from the Ultra API, passed through as-is.
    pub async fn get_holdings(&self, address: &str) -> Result<Value> {
        let url = format!("{}/ultra/v1/holdings/{}", self.base_url, address);
        let response = self.send(self.http.get(&url)).await?;
        Ok(response.json().await?)
    }

    /// Sends a request, attaching credentials. A non-success response is
    /// normalized into the uniform provider-error shape here, while the
    /// response body is still in hand.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let request = match &self.api_key {
            Some(key) => request.header("x-api-key", key),
            None => request,
        };
        let response = request.timeout(REQUEST_TIMEOUT).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let url = response.url().to_string();
            let body = response.text().await.unwrap_or_default();
            return Err(SwapError::Provider(NormalizedError::from_response(
                status, &url, &body,
            )));
        }
        Ok(response)
    }
}
