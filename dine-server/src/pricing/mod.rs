//! Money calculation
//!
//! All arithmetic runs on `Decimal`; values are converted back to `f64`
//! (rounded to 2 decimal places, half away from zero) for storage and
//! serialization.

pub mod customization;

use rust_decimal::prelude::*;

pub use customization::{customization_price, item_total, validate_selection};

const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Order-level amounts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderTotals {
    pub subtotal: f64,
    pub service_fee: f64,
    pub total: f64,
}

/// Subtotal, service fee (percent of subtotal) and total
pub fn order_totals(subtotal: Decimal, service_fee_percent: f64) -> OrderTotals {
    let subtotal = subtotal.round_dp_with_strategy(
        DECIMAL_PLACES,
        RoundingStrategy::MidpointAwayFromZero,
    );
    let fee = (subtotal * to_decimal(service_fee_percent) / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    OrderTotals {
        subtotal: to_f64(subtotal),
        service_fee: to_f64(fee),
        total: to_f64(subtotal + fee),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_rounding() {
        assert_eq!(to_f64(to_decimal(10.006)), 10.01);
        assert_eq!(to_f64(to_decimal(0.1) + to_decimal(0.2)), 0.3);
    }

    #[test]
    fn test_order_totals() {
        let totals = order_totals(to_decimal(123.45), 10.0);
        assert_eq!(totals.subtotal, 123.45);
        assert_eq!(totals.service_fee, 12.35);
        assert_eq!(totals.total, 135.8);

        let totals = order_totals(to_decimal(100.0), 11.0);
        assert_eq!(totals.service_fee, 11.0);
        assert_eq!(totals.total, 111.0);

        let free = order_totals(to_decimal(50.0), 0.0);
        assert_eq!(free.total, 50.0);
    }
}
