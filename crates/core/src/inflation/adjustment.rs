//! Per-account and general inflation adjustment.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use partida_shared::types::AccountId;
use partida_shared::types::money::{round_money, BALANCE_TOLERANCE};

use super::index::IndexSeries;
use crate::chart::Account;
use crate::ledger::{LineDraft, Movement};

/// Note written on every adjusted account line.
pub const ADJUSTMENT_NOTE: &str = "Inflation adjustment";

/// Note written on the inflation-exposure result line.
pub const REI_NOTE: &str = "REI - inflation exposure result";

/// One movement of an account with its restatement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustedMovement {
    /// Entry date of the movement.
    pub date: NaiveDate,
    /// Origin year.
    pub year: i32,
    /// Origin month.
    pub month: u32,
    /// Signed amount (`debit - credit`).
    pub amount: Decimal,
    /// Factor from origin to target month, if defined.
    pub factor: Option<Decimal>,
    /// `amount * (factor - 1)`, zero when the factor is undefined or 1.
    pub adjustment: Decimal,
}

/// Adjustment of a single account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAdjustment {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Sum of the movements up to the target date.
    pub original_balance: Decimal,
    /// Total adjustment rounded to the currency scale.
    pub adjustment: Decimal,
    /// `original_balance + adjustment`.
    pub adjusted_balance: Decimal,
    /// Movement-level trace.
    pub movements: Vec<AdjustedMovement>,
}

/// Adjustment of every eligible account of a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralAdjustment {
    /// Target date.
    pub as_of: NaiveDate,
    /// Index table used.
    pub table: String,
    /// Accounts whose adjustment exceeds the tolerance, in code order.
    pub accounts: Vec<AccountAdjustment>,
    /// Sum of positive adjustments.
    pub debit_side: Decimal,
    /// Sum of the magnitudes of negative adjustments.
    pub credit_side: Decimal,
    /// Inflation-exposure result, `debit_side - credit_side`.
    pub rei: Decimal,
}

/// Restates one account to the month of `as_of`.
///
/// Returns `None` when the account is not adjustable, postable and active,
/// or has no nonzero movement dated on or before `as_of`. Movements whose
/// factor is undefined or exactly 1 are traced with a zero adjustment.
#[must_use]
pub fn account_adjustment(
    account: &Account,
    movements: &[Movement],
    as_of: NaiveDate,
    series: &IndexSeries,
) -> Option<AccountAdjustment> {
    if !account.is_inflation_candidate() {
        return None;
    }

    let target = (as_of.year(), as_of.month());
    let mut original_balance = Decimal::ZERO;
    let mut total = Decimal::ZERO;
    let mut trace = Vec::new();

    for movement in movements
        .iter()
        .filter(|m| m.account_id == account.id && m.date <= as_of)
    {
        let amount = movement.signed_amount();
        if amount.is_zero() {
            continue;
        }
        original_balance += amount;

        let origin = (movement.date.year(), movement.date.month());
        let factor = series.factor(origin, target);
        let adjustment = match factor {
            Some(f) if f != Decimal::ONE => amount * (f - Decimal::ONE),
            _ => Decimal::ZERO,
        };
        total += adjustment;

        trace.push(AdjustedMovement {
            date: movement.date,
            year: origin.0,
            month: origin.1,
            amount,
            factor,
            adjustment,
        });
    }

    if trace.is_empty() {
        return None;
    }

    let adjustment = round_money(total);
    Some(AccountAdjustment {
        account_id: account.id,
        code: account.code.clone(),
        name: account.name.clone(),
        original_balance,
        adjustment,
        adjusted_balance: original_balance + adjustment,
        movements: trace,
    })
}

/// Runs [`account_adjustment`] over every eligible account and totals the
/// adjustments larger than one cent.
#[must_use]
pub fn general_adjustment(
    accounts: &[Account],
    movements: &[Movement],
    as_of: NaiveDate,
    table: &str,
    series: &IndexSeries,
) -> GeneralAdjustment {
    let mut adjusted: Vec<AccountAdjustment> = accounts
        .iter()
        .filter_map(|account| account_adjustment(account, movements, as_of, series))
        .filter(|adj| adj.adjustment.abs() > BALANCE_TOLERANCE)
        .collect();
    adjusted.sort_by(|a, b| a.code.cmp(&b.code));

    let debit_side: Decimal = adjusted
        .iter()
        .map(|a| a.adjustment)
        .filter(|adj| *adj > Decimal::ZERO)
        .sum();
    let credit_side: Decimal = adjusted
        .iter()
        .map(|a| a.adjustment)
        .filter(|adj| *adj < Decimal::ZERO)
        .map(|adj| -adj)
        .sum();

    GeneralAdjustment {
        as_of,
        table: table.to_string(),
        accounts: adjusted,
        debit_side,
        credit_side,
        rei: debit_side - credit_side,
    }
}

/// Builds the lines of the adjustment entry.
///
/// Each adjusted account gets a debit for a positive adjustment and a credit
/// for a negative one. The REI account balances the entry: a gain is
/// credited, a loss debited. Returns `None` when nothing was adjusted.
#[must_use]
pub fn adjustment_lines(general: &GeneralAdjustment, rei_account: AccountId) -> Option<Vec<LineDraft>> {
    if general.accounts.is_empty() && general.rei.is_zero() {
        return None;
    }

    let mut lines: Vec<LineDraft> = general
        .accounts
        .iter()
        .filter(|a| !a.adjustment.is_zero())
        .map(|a| {
            let line = if a.adjustment > Decimal::ZERO {
                LineDraft::debit(a.account_id, a.adjustment)
            } else {
                LineDraft::credit(a.account_id, -a.adjustment)
            };
            line.with_note(ADJUSTMENT_NOTE)
        })
        .collect();

    if general.rei > Decimal::ZERO {
        lines.push(LineDraft::credit(rei_account, general.rei).with_note(REI_NOTE));
    } else if general.rei < Decimal::ZERO {
        lines.push(LineDraft::debit(rei_account, -general.rei).with_note(REI_NOTE));
    }

    (!lines.is_empty()).then_some(lines)
}

/// Description of the adjustment entry, e.g. "Inflation adjustment as of 31/12/2024".
#[must_use]
pub fn adjustment_description(as_of: NaiveDate) -> String {
    format!("{ADJUSTMENT_NOTE} as of {}", as_of.format("%d/%m/%Y"))
}
