use alloy::sol;
use alloy::sol_types::SolEvent;
use alloy_primitives::{B256, Log};
use thiserror::Error;

sol! {
    #[derive(Debug)]
    event Transfer(address indexed from, address indexed to, uint256 value);

    #[derive(Debug)]
    event Swap(
        address indexed sender,
        uint256 amount0In,
        uint256 amount1In,
        uint256 amount0Out,
        uint256 amount1Out,
        address indexed to
    );

    function name() external view returns (string);
    function symbol() external view returns (string);
    function decimals() external view returns (uint8);
    function totalSupply() external view returns (uint256);
}

pub const TRANSFER_TOPIC: B256 = Transfer::SIGNATURE_HASH;
pub const SWAP_TOPIC: B256 = Swap::SIGNATURE_HASH;

#[derive(Debug, Error)]
pub enum EventDecodeError {
    #[error("log from {address} has no topics")]
    MissingTopic { address: alloy_primitives::Address },

    #[error("unexpected topic {topic} for {expected} event")]
    UnexpectedTopic { topic: B256, expected: &'static str },

    #[error("failed to decode {event} event: {source}")]
    Abi {
        event: &'static str,
        #[source]
        source: alloy::sol_types::Error,
    },
}

/// A receipt log decoded by its topic0 signature.
#[derive(Debug, Clone)]
pub enum DexEvent {
    Transfer(Transfer),
    Swap(Swap),
}

impl DexEvent {
    /// Returns `Ok(None)` for logs that are neither transfers nor V2 swaps.
    pub fn decode(log: &Log) -> Result<Option<Self>, EventDecodeError> {
        let Some(topic0) = topic0(log) else {
            return Ok(None);
        };

        let event = if topic0 == TRANSFER_TOPIC {
            Transfer::decode_raw_log(log.topics(), &log.data.data)
                .map(DexEvent::Transfer)
                .map_err(|source| EventDecodeError::Abi {
                    event: "Transfer",
                    source,
                })?
        } else if topic0 == SWAP_TOPIC {
            Swap::decode_raw_log(log.topics(), &log.data.data)
                .map(DexEvent::Swap)
                .map_err(|source| EventDecodeError::Abi {
                    event: "Swap",
                    source,
                })?
        } else {
            return Ok(None);
        };

        Ok(Some(event))
    }
}

pub fn topic0(log: &Log) -> Option<B256> {
    log.topics().first().copied()
}

pub fn decode_swap_event(log: &Log) -> Result<Swap, EventDecodeError> {
    match DexEvent::decode(log)? {
        Some(DexEvent::Swap(swap)) => Ok(swap),
        _ => match topic0(log) {
            Some(topic) => Err(EventDecodeError::UnexpectedTopic {
                topic,
                expected: "Swap",
            }),
            None => Err(EventDecodeError::MissingTopic {
                address: log.address,
            }),
        },
    }
}
