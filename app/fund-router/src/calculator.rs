//! Swap math: constant product output, concentrated liquidity, leg splitting and slippage floors

use crate::error::{FundError, Result};

pub const BPS_DENOMINATOR: u128 = 10_000;

/// Calculate output amount using constant product formula
/// Formula: (x + Δx * (1 - fee)) * (y - Δy) = x * y
///
/// # Arguments
/// * `amount_in` - Input amount
/// * `reserve_in` - Reserve of input token
/// * `reserve_out` - Reserve of output token
/// * `fee_bps` - Fee in basis points (e.g., 30 = 0.3%)
///
/// # Returns
/// Output amount after fees
pub fn calculate_amount_out(
    amount_in: u64,
    reserve_in: u64,
    reserve_out: u64,
    fee_bps: u16,
) -> Result<u64> {
    let amount_out = constant_product_out(
        amount_in as u128,
        reserve_in as u128,
        reserve_out as u128,
        fee_bps,
    )?;

    amount_out.try_into().map_err(|_| FundError::MathOverflow)
}

/// Output of a concentrated-liquidity pool over a single active range.
///
/// Inside the range the pool is a constant product curve on virtual reserves,
/// `(reserve_in + offset_in) * (reserve_out + offset_out) = k`. The offsets are
/// fixed by the range bounds. A trade paying out the whole real reserve would
/// cross the range boundary and is refused.
pub fn calculate_concentrated_amount_out(
    amount_in: u64,
    reserve_in: u64,
    reserve_out: u64,
    offset_in: u64,
    offset_out: u64,
    fee_bps: u16,
) -> Result<u64> {
    if reserve_out == 0 {
        return Err(FundError::InvalidReserves);
    }

    let virtual_in = (reserve_in as u128) + offset_in as u128;
    let virtual_out = (reserve_out as u128) + offset_out as u128;

    let amount_out = constant_product_out(amount_in as u128, virtual_in, virtual_out, fee_bps)?;

    if amount_out >= reserve_out as u128 {
        return Err(FundError::InvalidReserves);
    }

    amount_out.try_into().map_err(|_| FundError::MathOverflow)
}

/// Virtual offset that makes a range behave like `concentration` times its
/// real reserve at the current price
pub fn range_offset(reserve: u64, concentration: u32) -> Result<u64> {
    if concentration == 0 {
        return Err(FundError::ConfigError(
            "concentration factor must be at least 1".to_string(),
        ));
    }
    reserve
        .checked_mul(concentration as u64 - 1)
        .ok_or(FundError::MathOverflow)
}

fn constant_product_out(
    amount_in: u128,
    reserve_in: u128,
    reserve_out: u128,
    fee_bps: u16,
) -> Result<u128> {
    if reserve_in == 0 || reserve_out == 0 {
        return Err(FundError::InvalidReserves);
    }

    if fee_bps as u128 >= BPS_DENOMINATOR {
        return Err(FundError::ConfigError(format!(
            "fee of {} bps leaves nothing to swap",
            fee_bps
        )));
    }

    if amount_in == 0 {
        return Ok(0);
    }

    // amount_in_with_fee = amount_in * (10000 - fee_bps)
    let amount_in_with_fee = amount_in
        .checked_mul(BPS_DENOMINATOR - fee_bps as u128)
        .ok_or(FundError::MathOverflow)?;

    let numerator = amount_in_with_fee
        .checked_mul(reserve_out)
        .ok_or(FundError::MathOverflow)?;

    // reserve_in * 10000 + amount_in_with_fee
    let denominator = reserve_in
        .checked_mul(BPS_DENOMINATOR)
        .ok_or(FundError::MathOverflow)?
        .checked_add(amount_in_with_fee)
        .ok_or(FundError::MathOverflow)?;

    numerator
        .checked_div(denominator)
        .ok_or(FundError::MathOverflow)
}

/// Split a deposit into its two legs: `floor(amount / 2)` and the remainder.
///
/// For odd amounts the second leg carries the extra unit.
pub fn split_amount(amount: u64) -> (u64, u64) {
    let half = amount / 2;
    (half, amount - half)
}

/// Minimum acceptable output for a quote under a tolerance in basis points,
/// rounded down
pub fn min_amount_out(quote: u64, tolerance_bps: u16) -> Result<u64> {
    if tolerance_bps as u128 > BPS_DENOMINATOR {
        return Err(FundError::ConfigError(format!(
            "slippage tolerance of {} bps exceeds 100%",
            tolerance_bps
        )));
    }

    let floor = (quote as u128)
        .checked_mul(BPS_DENOMINATOR - tolerance_bps as u128)
        .ok_or(FundError::MathOverflow)?
        / BPS_DENOMINATOR;

    floor.try_into().map_err(|_| FundError::MathOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_calculate_amount_out_basic() {
        // Pool: 1000 WETH-equivalent vs 50000 USDC, 1 unit in, 0.25% fee
        let reserve_in = 1_000_000_000_000;
        let reserve_out = 50_000_000_000;
        let amount_in = 1_000_000_000;
        let fee_bps = 25;

        let amount_out = calculate_amount_out(amount_in, reserve_in, reserve_out, fee_bps).unwrap();

        // Expected: (1 * 0.9975 * 50000) / (1000 + 1 * 0.9975) ≈ 49.875
        assert!(amount_out > 49_800_000 && amount_out < 49_900_000);
    }

    #[test]
    fn test_calculate_amount_out_no_fee() {
        // (100 * 1000) / (1000 + 100) = 90.909...
        assert_eq!(calculate_amount_out(100, 1000, 1000, 0).unwrap(), 90);
    }

    #[test]
    fn test_calculate_amount_out_zero_input() {
        assert_eq!(calculate_amount_out(0, 1000, 1000, 25).unwrap(), 0);
    }

    #[test]
    fn test_calculate_amount_out_zero_reserves() {
        assert!(matches!(
            calculate_amount_out(100, 0, 1000, 25),
            Err(FundError::InvalidReserves)
        ));
        assert!(matches!(
            calculate_amount_out(100, 1000, 0, 25),
            Err(FundError::InvalidReserves)
        ));
    }

    #[test]
    fn test_calculate_amount_out_rejects_full_fee() {
        assert!(matches!(
            calculate_amount_out(100, 1000, 1000, 10_000),
            Err(FundError::ConfigError(_))
        ));
    }

    #[test]
    fn test_constant_product_property() {
        let reserve_in = 1_000_000_u128;
        let reserve_out = 50_000_000_u128;
        let amount_in = 10_000;

        let k_before = reserve_in * reserve_out;
        let amount_out =
            calculate_amount_out(amount_in, reserve_in as u64, reserve_out as u64, 0).unwrap();
        let k_after = (reserve_in + amount_in as u128) * (reserve_out - amount_out as u128);

        // Rounding down the output can only grow k
        assert!(k_after >= k_before);
        assert!(k_after - k_before < k_before / 1000);
    }

    #[test]
    fn test_concentrated_beats_constant_product() {
        let plain = calculate_amount_out(1_000_000, 1_000_000_000, 50_000_000_000, 30).unwrap();
        let concentrated = calculate_concentrated_amount_out(
            1_000_000,
            1_000_000_000,
            50_000_000_000,
            3_000_000_000,
            150_000_000_000,
            30,
        )
        .unwrap();

        assert!(concentrated > plain);
    }

    #[test]
    fn test_concentrated_without_offsets_is_constant_product() {
        let plain = calculate_amount_out(5_000, 1_000_000, 2_000_000, 30).unwrap();
        let concentrated =
            calculate_concentrated_amount_out(5_000, 1_000_000, 2_000_000, 0, 0, 30).unwrap();
        assert_eq!(plain, concentrated);
    }

    #[test]
    fn test_concentrated_out_of_range() {
        // Virtual 4000/4000 pays 2000 for 4000 in, more than the 1000 really held
        let result = calculate_concentrated_amount_out(4_000, 1_000, 1_000, 3_000, 3_000, 0);
        assert!(matches!(result, Err(FundError::InvalidReserves)));
    }

    #[test]
    fn test_concentrated_empty_range() {
        let result = calculate_concentrated_amount_out(10, 1_000, 0, 3_000, 3_000, 0);
        assert!(matches!(result, Err(FundError::InvalidReserves)));
    }

    #[test]
    fn test_range_offset() {
        assert_eq!(range_offset(1_000, 4).unwrap(), 3_000);
        assert_eq!(range_offset(1_000, 1).unwrap(), 0);
        assert!(matches!(range_offset(1_000, 0), Err(FundError::ConfigError(_))));
        assert!(matches!(range_offset(u64::MAX, 3), Err(FundError::MathOverflow)));
    }

    #[test]
    fn test_split_amount_odd_and_even() {
        assert_eq!(split_amount(3), (1, 2));
        assert_eq!(split_amount(4), (2, 2));
        assert_eq!(split_amount(1), (0, 1));
        assert_eq!(split_amount(0), (0, 0));
        assert_eq!(split_amount(u64::MAX), (u64::MAX / 2, u64::MAX / 2 + 1));
    }

    #[test]
    fn test_min_amount_out() {
        assert_eq!(min_amount_out(100, 200).unwrap(), 98);
        assert_eq!(min_amount_out(100, 0).unwrap(), 100);
        assert_eq!(min_amount_out(100, 10_000).unwrap(), 0);
        // 99 * 0.98 = 97.02, rounded down
        assert_eq!(min_amount_out(99, 200).unwrap(), 97);
        assert!(min_amount_out(100, 10_001).is_err());
    }

    proptest! {
        #[test]
        fn prop_split_legs_sum_to_amount(amount in any::<u64>()) {
            let (half, remaining) = split_amount(amount);
            prop_assert_eq!(half as u128 + remaining as u128, amount as u128);
            prop_assert!(remaining >= half);
            prop_assert!(remaining - half <= 1);
        }

        #[test]
        fn prop_min_amount_out_never_exceeds_quote(
            quote in any::<u64>(),
            tolerance_bps in 0u16..=10_000,
        ) {
            let floor = min_amount_out(quote, tolerance_bps).unwrap();
            prop_assert!(floor <= quote);
        }

        #[test]
        fn prop_output_less_than_reserve(
            amount_in in 1u64..1_000_000,
            reserve_in in 1_000_000u64..1_000_000_000,
            reserve_out in 1_000_000u64..1_000_000_000,
            fee_bps in 0u16..500,
        ) {
            let amount_out = calculate_amount_out(amount_in, reserve_in, reserve_out, fee_bps).unwrap();
            prop_assert!(amount_out < reserve_out);
        }

        #[test]
        fn prop_concentrated_round_trip_loses_value(
            amount_in in 1u64..1_000_000,
            reserve in 10_000_000u64..1_000_000_000,
            concentration in 1u32..10,
            fee_bps in 0u16..100,
        ) {
            let offset = range_offset(reserve, concentration).unwrap();
            let out = calculate_concentrated_amount_out(amount_in, reserve, reserve, offset, offset, fee_bps).unwrap();
            let back = calculate_concentrated_amount_out(
                out,
                reserve - out,
                reserve + amount_in,
                offset,
                offset,
                fee_bps,
            );
            // A round trip on the same range can never return more than was put in
            if let Ok(back) = back {
                prop_assert!(back <= amount_in);
            }
        }

        #[test]
        fn prop_larger_input_larger_output(
            amount_in_1 in 1_000u64..100_000,
            reserve_in in 1_000_000u64..1_000_000_000,
            reserve_out in 1_000_000u64..1_000_000_000,
            fee_bps in 0u16..500,
        ) {
            let out_1 = calculate_amount_out(amount_in_1, reserve_in, reserve_out, fee_bps).unwrap();
            let out_2 = calculate_amount_out(amount_in_1 * 2, reserve_in, reserve_out, fee_bps).unwrap();
            prop_assert!(out_2 > out_1);
        }
    }
}
