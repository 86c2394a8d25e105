//! Fixed-point price and quantity utilities.
//!
//! ## Overview
//!
//! All prices in the exchange are CPM values denominated in quote-currency
//! wei: a signed 64-bit integer scaled by 10^18. Quantities are unsigned
//! 64-bit impression counts. No floating point is used anywhere in the
//! matching path.
//!
//! ## Why Fixed-Point?
//!
//! Floating-point arithmetic can produce different results on different
//! hardware, breaking determinism. Fixed-point ensures identical results
//! everywhere.
//!
//! ## Scale Factor
//!
//! The scale factor is 10^18 (wei), matching the settlement currency.
//! Intermediate products are widened to 128 bits so that price-times-time
//! decay math and constant-product pool math cannot overflow.
//!
//! ## Examples
//!
//! ```
//! use adx_engine::types::price::{to_wei, from_wei};
//!
//! let price = to_wei("1.5").unwrap();
//! assert_eq!(price, 1_500_000_000_000_000_000);
//!
//! assert_eq!(from_wei(500_000_000_000_000_000), "0.5");
//! ```

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// Price in quote-currency wei (10^18 scale), CPM basis.
pub type Price = i64;

/// Quantity in whole impressions.
pub type Quantity = u64;

/// Scaling factor for fixed-point prices: 10^18 wei per quote unit.
pub const WEI_SCALE: i64 = 1_000_000_000_000_000_000;

// ============================================================================
// Conversion Functions
// ============================================================================

/// Convert a decimal CPM string to wei.
///
/// # Returns
///
/// * `Some(Price)` - The fixed-point representation
/// * `None` - If parsing fails, the value is negative, or it is out of range
///
/// # Example
///
/// ```
/// use adx_engine::types::price::to_wei;
///
/// assert_eq!(to_wei("1"), Some(1_000_000_000_000_000_000));
/// assert_eq!(to_wei("0.5"), Some(500_000_000_000_000_000));
/// assert_eq!(to_wei("-1"), None);
/// ```
pub fn to_wei(s: &str) -> Option<Price> {
    let decimal = Decimal::from_str(s).ok()?;
    decimal_to_wei(decimal)
}

/// Convert a `Decimal` quote amount to wei.
///
/// Negative values are rejected: order and floor prices are non-negative,
/// the signed `Price` type exists for arithmetic headroom only.
pub fn decimal_to_wei(d: Decimal) -> Option<Price> {
    if d.is_sign_negative() {
        return None;
    }

    let scaled = d.checked_mul(Decimal::from(WEI_SCALE))?;
    scaled.round_dp(0).to_i64()
}

/// Convert a wei price to a `Decimal` quote amount.
pub fn wei_to_decimal(value: Price) -> Decimal {
    Decimal::from(value) / Decimal::from(WEI_SCALE)
}

/// Convert a wei price to a human-readable string (trailing zeros trimmed).
///
/// # Example
///
/// ```
/// use adx_engine::types::price::from_wei;
///
/// assert_eq!(from_wei(1_000_000_000_000_000_000), "1");
/// assert_eq!(from_wei(1_500_000_000_000_000_000), "1.5");
/// ```
pub fn from_wei(value: Price) -> String {
    format!("{}", wei_to_decimal(value).normalize())
}

// ============================================================================
// Widened Integer Arithmetic
// ============================================================================

/// Scale a price by the ratio `num / den` with a 128-bit intermediate,
/// floor-rounded.
///
/// This is the primitive behind time-decay pricing: the product is widened
/// before the division so no representable input can overflow.
///
/// # Panics
///
/// Panics if `den == 0` or the result does not fit in `i64`. Both are
/// programmer errors per the engine's arithmetic policy.
///
/// # Example
///
/// ```
/// use adx_engine::types::price::scale_by_ratio;
///
/// // half the window remaining: 500 * 500 / 1000 = 250
/// assert_eq!(scale_by_ratio(500, 500, 1_000), 250);
/// ```
pub fn scale_by_ratio(value: i64, num: u64, den: u64) -> i64 {
    let wide = (value as i128) * (num as i128) / (den as i128);
    i64::try_from(wide).expect("scale_by_ratio result out of range")
}

/// Floor midpoint of two prices, computed in 128 bits.
///
/// Used for the uniform clearing price; safe for any pair of `i64` inputs.
#[inline]
pub fn midpoint(a: Price, b: Price) -> Price {
    ((a as i128 + b as i128) / 2) as Price
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_constant() {
        assert_eq!(WEI_SCALE, 1_000_000_000_000_000_000);
    }

    #[test]
    fn test_to_wei_basic() {
        assert_eq!(to_wei("1"), Some(1_000_000_000_000_000_000));
        assert_eq!(to_wei("1.0"), Some(1_000_000_000_000_000_000));
        assert_eq!(to_wei("0.5"), Some(500_000_000_000_000_000));
        assert_eq!(to_wei("0.000000000000000001"), Some(1));
        assert_eq!(to_wei("0"), Some(0));
    }

    #[test]
    fn test_to_wei_edge_cases() {
        // Negative values are rejected
        assert_eq!(to_wei("-1.0"), None);

        // Invalid strings are rejected
        assert_eq!(to_wei("abc"), None);
        assert_eq!(to_wei(""), None);

        // Out of i64 range (i64::MAX is ~9.22 quote units)
        assert_eq!(to_wei("10"), None);
    }

    #[test]
    fn test_from_wei() {
        assert_eq!(from_wei(1_000_000_000_000_000_000), "1");
        assert_eq!(from_wei(500_000_000_000_000_000), "0.5");
        assert_eq!(from_wei(1), "0.000000000000000001");
        assert_eq!(from_wei(0), "0");
    }

    #[test]
    fn test_roundtrip() {
        let values = ["1", "0.5", "0.000000000000000001", "2.25"];

        for s in values {
            let wei = to_wei(s).unwrap();
            let back = from_wei(wei);
            let original = Decimal::from_str(s).unwrap();
            let converted = Decimal::from_str(&back).unwrap();
            assert_eq!(original, converted, "Roundtrip failed for {}", s);
        }
    }

    #[test]
    fn test_scale_by_ratio_basic() {
        assert_eq!(scale_by_ratio(1000, 500, 1000), 500);
        assert_eq!(scale_by_ratio(7, 3, 2), 10); // floor(10.5)
        assert_eq!(scale_by_ratio(0, 123, 7), 0);
    }

    #[test]
    fn test_scale_by_ratio_no_intermediate_overflow() {
        // value * num overflows i64 but the widened intermediate does not
        let value = i64::MAX / 2;
        let result = scale_by_ratio(value, 1_000_000, 1_000_000);
        assert_eq!(result, value);
    }

    #[test]
    #[should_panic]
    fn test_scale_by_ratio_zero_divisor_panics() {
        scale_by_ratio(1, 1, 0);
    }

    #[test]
    fn test_midpoint() {
        assert_eq!(midpoint(1100, 1500), 1300);
        assert_eq!(midpoint(1200, 1300), 1250);
        // Floor rounding on odd sums
        assert_eq!(midpoint(1, 2), 1);
        // No overflow near the extremes
        assert_eq!(midpoint(i64::MAX, i64::MAX), i64::MAX);
    }
}
