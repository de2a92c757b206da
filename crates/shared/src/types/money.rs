//! Money helpers with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every amount in the ledger is a `rust_decimal::Decimal`.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places of the ledger currency unit.
pub const CURRENCY_SCALE: u32 = 2;

/// Maximum accepted difference between total debit and total credit (0.01).
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Rounds an amount to the currency scale using Banker's Rounding.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Returns true if two amounts differ by no more than `tolerance`.
#[must_use]
pub fn within_tolerance(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    (a - b).abs() <= tolerance
}

/// Splits a signed net amount into its (debit, credit) presentation.
///
/// A non-negative net is a debit balance, a negative net a credit balance.
/// Exactly one of the two returned values can be non-zero.
#[must_use]
pub fn split_net(net: Decimal) -> (Decimal, Decimal) {
    if net >= Decimal::ZERO {
        (net, Decimal::ZERO)
    } else {
        (Decimal::ZERO, -net)
    }
}
