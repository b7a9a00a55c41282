use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use once_cell::sync::Lazy;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;
use spl_token::solana_program::program_pack::Pack;
use spl_token::state::Mint;
use tracing::{debug, warn};

use crate::error::{Result, SwapError};
use crate::jupiter_client::{JupiterClient, MintInformation};

/// A resolved token: canonical mint address plus decimal precision.
/// Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub address: Pubkey,
    pub decimals: u8,
}

/// Curated registry: lower-cased symbol -> token.
pub type TokenMap = HashMap<String, TokenInfo>;

static CURATED_TOKENS: &str = include_str!("../data/solana_tokens.csv");

/// Upper bound on the account-data lookup.
const RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Parses the curated token list. Symbols are lower-cased; rows with a
/// missing field, an unparseable decimals value, or a malformed address are
/// skipped.
pub fn load_token_map() -> TokenMap {
    let mut map = TokenMap::new();
    for row in CURATED_TOKENS.lines().skip(1) {
        let mut columns = row.split(',');
        let (Some(symbol), Some(address), Some(decimals)) =
            (columns.next(), columns.next(), columns.next())
        else {
            continue;
        };
        let symbol = symbol.trim();
        if symbol.is_empty() {
            continue;
        }
        let Ok(decimals) = decimals.trim().parse::<u8>() else {
            continue;
        };
        let Ok(address) = Pubkey::from_str(address.trim()) else {
            warn!(symbol, "curated token list has a malformed address, skipping");
            continue;
        };
        map.insert(symbol.to_lowercase(), TokenInfo { address, decimals });
    }
    map
}

/// Process-wide curated registry. The list is static, so a single load
/// behind a read-only accessor is sufficient.
pub fn curated_registry() -> &'static TokenMap {
    static REGISTRY: Lazy<TokenMap> = Lazy::new(load_token_map);
    &REGISTRY
}

/// Whether a string is syntactically a Solana public key (base58, 32 bytes).
pub fn is_address(value: &str) -> bool {
    Pubkey::from_str(value).is_ok()
}

/// Outcome of resolving a symbol-or-address token reference.
#[derive(Debug, Clone)]
pub enum TokenLookupResult {
    /// Unambiguously resolved to a single token.
    Resolved(TokenInfo),
    /// Search produced several plausible tokens; the caller must
    /// disambiguate. Never empty.
    Candidates(Vec<MintInformation>),
    /// Nothing matched the reference.
    NotFound,
}

/// Resolves a symbol-or-address reference, short-circuiting on the first
/// authoritative answer: a syntactically valid address is looked up
/// on-chain, a curated symbol bypasses remote search, and only then is the
/// provider's fuzzy search consulted.
pub async fn resolve_token(
    reference: &str,
    rpc_url: &str,
    jupiter: &JupiterClient,
    registry: &TokenMap,
    min_score: f64,
) -> Result<TokenLookupResult> {
    if is_address(reference) {
        let token = fetch_mint(rpc_url, reference).await?;
        return Ok(TokenLookupResult::Resolved(token));
    }

    if let Some(token) = registry.get(&reference.to_lowercase()) {
        return Ok(TokenLookupResult::Resolved(token.clone()));
    }

    debug!(reference, "token not curated, searching Jupiter");
    let matches = jupiter.search_token(reference, min_score).await?;
    select_token(matches, min_score)
}

/// Authoritative mint lookup by address. The account must decode as an SPL
/// mint; an account that exists but is not a mint is a decode error, not a
/// missing token.
async fn fetch_mint(rpc_url: &str, address: &str) -> Result<TokenInfo> {
    let pubkey =
        Pubkey::from_str(address).map_err(|e| SwapError::SolanaRpc(e.to_string()))?;
    let client = RpcClient::new_with_timeout(rpc_url.to_string(), RPC_TIMEOUT);
    let account = client
        .get_account(&pubkey)
        .await
        .map_err(|e| SwapError::SolanaRpc(e.to_string()))?;
    let mint = Mint::unpack(&account.data).map_err(|e| SwapError::AccountDecode {
        address: address.to_string(),
        message: e.to_string(),
    })?;
    Ok(TokenInfo {
        address: pubkey,
        decimals: mint.decimals,
    })
}

/// Tie-break over search results. Zero results is a deliberate NotFound; a
/// single result resolves; with several, the strict min-score cut either
/// narrows to one (resolved), to several (still ambiguous), or to none, in
/// which case the full set goes back to the caller to disambiguate.
fn select_token(matches: Vec<MintInformation>, min_score: f64) -> Result<TokenLookupResult> {
    match matches.len() {
        0 => Ok(TokenLookupResult::NotFound),
        1 => Ok(TokenLookupResult::Resolved(as_token_info(&matches[0])?)),
        _ => {
            let strong: Vec<MintInformation> = matches
                .iter()
                .filter(|m| m.score() >= min_score)
                .cloned()
                .collect();
            match strong.len() {
                0 => Ok(TokenLookupResult::Candidates(matches)),
                1 => Ok(TokenLookupResult::Resolved(as_token_info(&strong[0])?)),
                _ => Ok(TokenLookupResult::Candidates(strong)),
            }
        }
    }
}

/// A search match must carry both a parseable id and a decimals value to be
/// usable; missing either is a data error, never a silent default.
fn as_token_info(info: &MintInformation) -> Result<TokenInfo> {
    let decimals = info
        .decimals
        .ok_or_else(|| SwapError::InsufficientTokenData {
            id: info.id.clone(),
        })?;
    let address =
        Pubkey::from_str(&info.id).map_err(|_| SwapError::InsufficientTokenData {
            id: info.id.clone(),
        })?;
    Ok(TokenInfo { address, decimals })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

    fn search_match(id: &str, symbol: &str, decimals: Option<u8>, score: f64) -> MintInformation {
        MintInformation {
            id: id.to_string(),
            symbol: Some(symbol.to_string()),
            decimals,
            organic_score: Some(score),
            ..Default::default()
        }
    }

    #[test]
    fn test_load_token_map_curated_entries() {
        let map = load_token_map();
        assert_eq!(
            map.get("usdc"),
            Some(&TokenInfo {
                address: Pubkey::from_str(USDC_MINT).unwrap(),
                decimals: 6,
            })
        );
        assert_eq!(
            map.get("pump"),
            Some(&TokenInfo {
                address: Pubkey::from_str("pumpCmXqMfrsAkQ5r49WcJnRayYRqmXz6ae8H7H9Dfn").unwrap(),
                decimals: 6,
            })
        );
        assert_eq!(
            map.get("trump"),
            Some(&TokenInfo {
                address: Pubkey::from_str("6p6xgHyF7AeE6TZkSmFsko444wqoP15icUSqi2jfGiPN").unwrap(),
                decimals: 6,
            })
        );
        // Keys are lower-cased; the raw header row never becomes an entry.
        assert!(map.get("USDC").is_none());
        assert!(map.get("symbol").is_none());
    }

    #[test]
    fn test_is_address() {
        assert!(!is_address("1234567890"));
        assert!(!is_address("USDC"));
        assert!(is_address("So11111111111111111111111111111111111111112"));
        assert!(is_address("6p6xgHyF7AeE6TZkSmFsko444wqoP15icUSqi2jfGiPN"));
        assert!(is_address("pumpCmXqMfrsAkQ5r49WcJnRayYRqmXz6ae8H7H9Dfn"));
        assert!(is_address("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"));
    }

    #[test]
    fn test_curated_symbol_resolves_without_network() {
        // Symbol hits short-circuit before any RPC or search call; nothing
        // here can reach the network.
        let registry = load_token_map();
        let jupiter = JupiterClient::new(None);
        let result = tokio_test::block_on(resolve_token(
            "USDC",
            "http://unreachable.invalid",
            &jupiter,
            &registry,
            95.0,
        ))
        .unwrap();
        match result {
            TokenLookupResult::Resolved(token) => {
                assert_eq!(token.address, Pubkey::from_str(USDC_MINT).unwrap());
                assert_eq!(token.decimals, 6);
            }
            other => panic!("expected Resolved, got {other:?}"),
        }
    }

    #[test]
    fn test_select_token_empty_is_not_found() {
        let result = select_token(vec![], 95.0).unwrap();
        assert!(matches!(result, TokenLookupResult::NotFound));
    }

    #[test]
    fn test_select_token_single_match_resolves() {
        let result = select_token(vec![search_match(USDC_MINT, "USDC", Some(6), 99.0)], 95.0).unwrap();
        match result {
            TokenLookupResult::Resolved(token) => {
                assert_eq!(token.address, Pubkey::from_str(USDC_MINT).unwrap());
                assert_eq!(token.decimals, 6);
            }
            other => panic!("expected Resolved, got {other:?}"),
        }
    }

    #[test]
    fn test_select_token_single_match_missing_decimals_is_fatal() {
        let result = select_token(vec![search_match(USDC_MINT, "USDC", None, 99.0)], 95.0);
        assert!(matches!(
            result,
            Err(SwapError::InsufficientTokenData { .. })
        ));
    }

    #[test]
    fn test_select_token_single_match_bad_id_is_fatal() {
        let result = select_token(vec![search_match("", "USDC", Some(6), 99.0)], 95.0);
        assert!(matches!(
            result,
            Err(SwapError::InsufficientTokenData { .. })
        ));
    }

    #[test]
    fn test_select_token_strict_filter_narrows_to_one() {
        let matches = vec![
            search_match(USDC_MINT, "USDC", Some(6), 100.0),
            search_match("Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB", "USDT", Some(6), 60.0),
        ];
        let result = select_token(matches, 95.0).unwrap();
        match result {
            TokenLookupResult::Resolved(token) => {
                assert_eq!(token.address, Pubkey::from_str(USDC_MINT).unwrap());
            }
            other => panic!("expected Resolved, got {other:?}"),
        }
    }

    #[test]
    fn test_select_token_all_below_threshold_returns_full_set() {
        let matches = vec![
            search_match(USDC_MINT, "USDC", Some(6), 60.0),
            search_match("Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB", "USDT", Some(6), 55.0),
        ];
        let result = select_token(matches, 95.0).unwrap();
        match result {
            TokenLookupResult::Candidates(tokens) => assert_eq!(tokens.len(), 2),
            other => panic!("expected Candidates, got {other:?}"),
        }
    }

    #[test]
    fn test_select_token_several_strong_matches_stay_ambiguous() {
        let matches = vec![
            search_match(USDC_MINT, "USDC", Some(6), 99.0),
            search_match("Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB", "USDT", Some(6), 98.0),
            search_match("So11111111111111111111111111111111111111112", "SOL", Some(9), 10.0),
        ];
        let result = select_token(matches, 95.0).unwrap();
        match result {
            TokenLookupResult::Candidates(tokens) => {
                // Narrowed to the strong ones, the weak match dropped.
                assert_eq!(tokens.len(), 2);
                assert!(tokens.iter().all(|t| t.score() >= 95.0));
            }
            other => panic!("expected Candidates, got {other:?}"),
        }
    }
}
