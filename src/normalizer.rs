use crate::events::{EventDecodeError, Swap, decode_swap_event};
use crate::models::{SwapAmounts, TokenAmount, TokenMetadata};
use alloy_primitives::{Log, U256};

/// Amount of token A entering the route, read from the first swap.
///
/// In a direct swap only one of the two input slots is non-zero.
pub fn input_amount(swap: &Swap) -> U256 {
    if swap.amount0In.is_zero() {
        swap.amount1In
    } else {
        swap.amount0In
    }
}

/// Amount of token B leaving the route, read from the last swap.
pub fn output_amount(swap: &Swap) -> U256 {
    if swap.amount1Out.is_zero() {
        swap.amount0Out
    } else {
        swap.amount1Out
    }
}

/// Scales the outer swap amounts of a route by each token's decimals.
///
/// `swap_logs` must be non-empty and contain only swap-topic logs.
pub fn normalize(
    swap_logs: &[&Log],
    token_a: &TokenMetadata,
    token_b: &TokenMetadata,
) -> Result<SwapAmounts, EventDecodeError> {
    let (Some(first_log), Some(last_log)) = (swap_logs.first(), swap_logs.last()) else {
        return Ok(SwapAmounts {
            amount_in: TokenAmount::new(U256::ZERO, token_a.decimals),
            amount_out: TokenAmount::new(U256::ZERO, token_b.decimals),
        });
    };

    let first = decode_swap_event(first_log)?;
    let last = decode_swap_event(last_log)?;

    // A side whose two slots are both zero stays 0; see SwapAmounts::is_degenerate.
    Ok(SwapAmounts {
        amount_in: TokenAmount::new(input_amount(&first), token_a.decimals),
        amount_out: TokenAmount::new(output_amount(&last), token_b.decimals),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::SolEvent;
    use alloy_primitives::{Address, address};

    fn swap_log(amounts: [u64; 4]) -> Log {
        let swap = Swap {
            sender: Address::ZERO,
            amount0In: U256::from(amounts[0]),
            amount1In: U256::from(amounts[1]),
            amount0Out: U256::from(amounts[2]),
            amount1Out: U256::from(amounts[3]),
            to: Address::ZERO,
        };
        Log {
            address: address!("b4e16d0168e52d35cacd2c6185b44281ec28c9dc"),
            data: swap.encode_log_data(),
        }
    }

    fn token(decimals: u8) -> TokenMetadata {
        TokenMetadata {
            decimals,
            supply_decimals: decimals,
            ..TokenMetadata::unknown(Address::ZERO)
        }
    }

    #[test]
    fn picks_non_zero_slots_from_outer_swaps() {
        let first = swap_log([0, 2_000_000_000_000_000_000, 0, 0]);
        let middle = swap_log([9, 9, 9, 9]);
        let last = swap_log([0, 0, 1_500_000, 0]);

        let amounts = normalize(&[&first, &middle, &last], &token(18), &token(6)).unwrap();

        assert_eq!(amounts.amount_in.to_string(), "2.0");
        assert_eq!(amounts.amount_out.to_string(), "1.5");
        assert!(!amounts.is_degenerate());
    }

    #[test]
    fn prefers_first_input_and_second_output_slots() {
        let log = swap_log([5, 7, 11, 13]);
        let amounts = normalize(&[&log], &token(0), &token(0)).unwrap();

        assert_eq!(amounts.amount_in.raw, U256::from(5u64));
        assert_eq!(amounts.amount_out.raw, U256::from(13u64));
    }

    #[test]
    fn zero_slots_yield_zero_instead_of_failing() {
        let log = swap_log([0, 0, 0, 0]);
        let amounts = normalize(&[&log], &token(18), &token(6)).unwrap();

        assert!(amounts.amount_in.is_zero());
        assert!(amounts.amount_out.is_zero());
        assert!(amounts.is_degenerate());
    }

    #[test]
    fn undecodable_swap_is_an_error() {
        let log = Log::new_unchecked(
            Address::ZERO,
            vec![crate::events::TRANSFER_TOPIC],
            Default::default(),
        );
        assert!(normalize(&[&log], &token(18), &token(18)).is_err());
    }
}
