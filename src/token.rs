use crate::events::{decimalsCall, nameCall, symbolCall, totalSupplyCall};
use crate::models::{DEFAULT_DECIMALS, TokenMetadata, UNKNOWN};
use crate::rpc::ChainClient;
use alloy::sol_types::SolCall;
use alloy_primitives::Address;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TokenResolutionError {
    #[error("{field}() call on token {address} failed: {source}")]
    Call {
        address: Address,
        field: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("{field}() on token {address} returned undecodable data: {source}")]
    Decode {
        address: Address,
        field: &'static str,
        #[source]
        source: alloy::sol_types::Error,
    },
}

async fn call_contract<C, T>(
    client: &C,
    address: Address,
    field: &'static str,
    call: T,
) -> Result<T::Return, TokenResolutionError>
where
    C: ChainClient + ?Sized,
    T: SolCall,
{
    let output = client
        .call(address, call.abi_encode().into())
        .await
        .map_err(|source| TokenResolutionError::Call {
            address,
            field,
            source,
        })?;

    T::abi_decode_returns(&output).map_err(|source| TokenResolutionError::Decode {
        address,
        field,
        source,
    })
}

/// Reads ERC-20 metadata for `address` one field at a time.
///
/// A field whose call fails keeps its default from [`TokenMetadata::unknown`] and its
/// error is returned next to the metadata, so a token with a non-standard `name()`
/// still keeps the `decimals()` it reported.
pub async fn fetch_token_metadata<C>(
    client: &C,
    address: Address,
) -> (TokenMetadata, Vec<TokenResolutionError>)
where
    C: ChainClient + ?Sized,
{
    let (name, symbol, decimals, total_supply) = tokio::join!(
        call_contract(client, address, "name", nameCall {}),
        call_contract(client, address, "symbol", symbolCall {}),
        call_contract(client, address, "decimals", decimalsCall {}),
        call_contract(client, address, "totalSupply", totalSupplyCall {}),
    );

    let mut token = TokenMetadata::unknown(address);
    let mut errors = Vec::new();

    if let Some(name) = keep_ok(name, &mut errors) {
        token.name = non_empty_or_unknown(name);
    }
    if let Some(symbol) = keep_ok(symbol, &mut errors) {
        token.symbol = non_empty_or_unknown(symbol);
    }
    if let Some(decimals) = keep_ok(decimals, &mut errors) {
        token.supply_decimals = decimals;
        token.decimals = if decimals == 0 {
            DEFAULT_DECIMALS
        } else {
            decimals
        };
    }
    if let Some(total_supply) = keep_ok(total_supply, &mut errors) {
        token.total_supply = total_supply;
    }

    debug!(
        "Fetched token {:?}: {} ({}), {} decimals, {} field(s) failed",
        address,
        token.name,
        token.symbol,
        token.decimals,
        errors.len()
    );

    (token, errors)
}

/// Reads ERC-20 metadata for `address`, substituting defaults for empty values.
/// Fails with the first field that could not be read.
pub async fn resolve_token<C>(
    client: &C,
    address: Address,
) -> Result<TokenMetadata, TokenResolutionError>
where
    C: ChainClient + ?Sized,
{
    let (token, errors) = fetch_token_metadata(client, address).await;
    match errors.into_iter().next() {
        Some(e) => Err(e),
        None => Ok(token),
    }
}

fn keep_ok<T>(
    result: Result<T, TokenResolutionError>,
    errors: &mut Vec<TokenResolutionError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            errors.push(e);
            None
        }
    }
}

fn non_empty_or_unknown(value: String) -> String {
    if value.trim().is_empty() {
        UNKNOWN.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::MockChainClient;
    use alloy::sol_types::SolValue;
    use alloy_primitives::{B256, Bytes, U256, address};

    fn erc20_client(name: &str, symbol: &str, decimals: u8, supply: U256) -> MockChainClient {
        let (name, symbol) = (name.to_string(), symbol.to_string());
        let mut client = MockChainClient::new();
        client.expect_call().returning(move |_, data| {
            let selector: [u8; 4] = data[..4].try_into().unwrap();
            let encoded = match selector {
                nameCall::SELECTOR => name.abi_encode(),
                symbolCall::SELECTOR => symbol.abi_encode(),
                decimalsCall::SELECTOR => decimalsCall::abi_encode_returns(&decimals),
                totalSupplyCall::SELECTOR => supply.abi_encode(),
                _ => panic!("unexpected selector {selector:?}"),
            };
            Ok(Bytes::from(encoded))
        });
        client
    }

    const TOKEN: Address = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");

    #[tokio::test]
    async fn reads_standard_metadata() {
        let client = erc20_client("USD Coin", "USDC", 6, U256::from(25_000_000u64));

        let token = resolve_token(&client, TOKEN).await.unwrap();

        assert_eq!(token.name, "USD Coin");
        assert_eq!(token.symbol, "USDC");
        assert_eq!(token.decimals, 6);
        assert_eq!(token.supply().to_string(), "25.0");
    }

    #[tokio::test]
    async fn empty_values_fall_back_to_defaults() {
        let client = erc20_client("", " ", 0, U256::ZERO);

        let token = resolve_token(&client, TOKEN).await.unwrap();

        assert_eq!(token.name, "Unknown");
        assert_eq!(token.symbol, "Unknown");
        assert_eq!(token.decimals, 18);
        assert!(token.supply().is_zero());
    }

    #[tokio::test]
    async fn failed_call_is_a_typed_error() {
        let mut client = MockChainClient::new();
        client
            .expect_call()
            .returning(|_, _| Err(anyhow::anyhow!("execution reverted")));

        let err = resolve_token(&client, TOKEN).await.unwrap_err();
        assert!(matches!(err, TokenResolutionError::Call { address, .. } if address == TOKEN));
    }

    #[tokio::test]
    async fn non_contract_returns_are_decode_errors() {
        let mut client = MockChainClient::new();
        client.expect_call().returning(|_, _| Ok(Bytes::new()));

        let err = resolve_token(&client, TOKEN).await.unwrap_err();
        assert!(matches!(err, TokenResolutionError::Decode { .. }));
    }

    #[tokio::test]
    async fn bytes32_name_keeps_reported_decimals() {
        let mut client = MockChainClient::new();
        client.expect_call().returning(|_, data| {
            let selector: [u8; 4] = data[..4].try_into().unwrap();
            let encoded = match selector {
                nameCall::SELECTOR | symbolCall::SELECTOR => B256::repeat_byte(0x41).abi_encode(),
                decimalsCall::SELECTOR => decimalsCall::abi_encode_returns(&6u8),
                totalSupplyCall::SELECTOR => U256::from(2_500_000u64).abi_encode(),
                _ => panic!("unexpected selector {selector:?}"),
            };
            Ok(Bytes::from(encoded))
        });

        let (token, errors) = fetch_token_metadata(&client, TOKEN).await;

        assert_eq!(token.name, "Unknown");
        assert_eq!(token.symbol, "Unknown");
        assert_eq!(token.decimals, 6);
        assert_eq!(token.supply().to_string(), "2.5");
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(
            e,
            TokenResolutionError::Decode { field, .. } if *field == "name" || *field == "symbol"
        )));

        let err = resolve_token(&client, TOKEN).await.unwrap_err();
        assert!(matches!(err, TokenResolutionError::Decode { field: "name", .. }));
    }
}
