//! Period balance arithmetic.
//!
//! A period balance accumulates the debits, credits and `debit - credit`
//! net of one account in one calendar month. Posting a line applies its
//! amounts to the period of the entry date; voiding or amending reverses
//! them against that same period. Replaying the active lines from scratch
//! must give the same periods as the incremental path.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use partida_shared::types::AccountId;

/// Identifies one period balance row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    /// Account the period belongs to.
    pub account_id: AccountId,
    /// Calendar year.
    pub year: i32,
    /// Calendar month (1-12).
    pub month: u32,
}

impl PeriodKey {
    /// Returns the period of `date` for an account.
    #[must_use]
    pub fn new(account_id: AccountId, date: NaiveDate) -> Self {
        Self {
            account_id,
            year: date.year(),
            month: date.month(),
        }
    }
}

/// Accumulated amounts of one period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTotals {
    /// Accumulated debit.
    pub debit_total: Decimal,
    /// Accumulated credit.
    pub credit_total: Decimal,
    /// Accumulated `debit - credit`.
    pub net: Decimal,
}

impl PeriodTotals {
    /// Adds a movement.
    pub fn apply(&mut self, debit: Decimal, credit: Decimal) {
        self.debit_total += debit;
        self.credit_total += credit;
        self.net += debit - credit;
    }

    /// Removes a movement previously applied.
    pub fn reverse(&mut self, debit: Decimal, credit: Decimal) {
        self.apply(-debit, -credit);
    }

    /// Returns true if nothing is accumulated.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.debit_total.is_zero() && self.credit_total.is_zero() && self.net.is_zero()
    }
}

/// Balance cached on the account row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedBalance {
    /// Running `debit - credit` over all active lines.
    pub balance: Decimal,
    /// Most recent movement date seen.
    pub last_movement: Option<NaiveDate>,
}

impl CachedBalance {
    /// Adds a movement, advancing the last movement date when `date` is newer.
    pub fn apply(&mut self, date: NaiveDate, debit: Decimal, credit: Decimal) {
        self.balance += debit - credit;
        if self.last_movement.is_none_or(|last| date > last) {
            self.last_movement = Some(date);
        }
    }

    /// Removes a movement. The last movement date is left as is.
    pub fn reverse(&mut self, debit: Decimal, credit: Decimal) {
        self.balance -= debit - credit;
    }
}

/// A posted line reduced to what balances need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    /// Posted account.
    pub account_id: AccountId,
    /// Entry date.
    pub date: NaiveDate,
    /// Entry number, second replay key after the date.
    pub entry_number: i32,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
}

impl Movement {
    /// Returns `debit - credit`.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.debit - self.credit
    }

    /// Returns the period this movement lands in.
    #[must_use]
    pub fn period(&self) -> PeriodKey {
        PeriodKey::new(self.account_id, self.date)
    }
}

/// In-memory set of period balances and cached account balances.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceBook {
    periods: BTreeMap<PeriodKey, PeriodTotals>,
    accounts: BTreeMap<AccountId, CachedBalance>,
}

impl BalanceBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a book by applying `movements` in (date, entry number) order.
    #[must_use]
    pub fn replay<'a, I>(movements: I) -> Self
    where
        I: IntoIterator<Item = &'a Movement>,
    {
        let mut ordered: Vec<&Movement> = movements.into_iter().collect();
        ordered.sort_by_key(|m| (m.date, m.entry_number));

        let mut book = Self::new();
        for movement in ordered {
            book.apply(movement);
        }
        book
    }

    /// Applies a movement to its period and account.
    pub fn apply(&mut self, movement: &Movement) {
        self.periods
            .entry(movement.period())
            .or_default()
            .apply(movement.debit, movement.credit);
        self.accounts
            .entry(movement.account_id)
            .or_default()
            .apply(movement.date, movement.debit, movement.credit);
    }

    /// Reverses a movement against the period of its own date.
    pub fn reverse(&mut self, movement: &Movement) {
        self.periods
            .entry(movement.period())
            .or_default()
            .reverse(movement.debit, movement.credit);
        self.accounts
            .entry(movement.account_id)
            .or_default()
            .reverse(movement.debit, movement.credit);
    }

    /// Returns the totals of one period.
    #[must_use]
    pub fn period(&self, key: &PeriodKey) -> PeriodTotals {
        self.periods.get(key).copied().unwrap_or_default()
    }

    /// Iterates over every period row, including ones reversed back to zero.
    pub fn periods(&self) -> impl Iterator<Item = (&PeriodKey, &PeriodTotals)> {
        self.periods.iter()
    }

    /// Period rows that still hold amounts, for comparing books.
    #[must_use]
    pub fn non_zero_periods(&self) -> BTreeMap<PeriodKey, PeriodTotals> {
        self.periods
            .iter()
            .filter(|(_, totals)| !totals.is_zero())
            .map(|(key, totals)| (*key, *totals))
            .collect()
    }

    /// Returns the cached balance of an account.
    #[must_use]
    pub fn account(&self, account_id: AccountId) -> CachedBalance {
        self.accounts.get(&account_id).copied().unwrap_or_default()
    }

    /// Iterates over cached account balances.
    pub fn accounts(&self) -> impl Iterator<Item = (&AccountId, &CachedBalance)> {
        self.accounts.iter()
    }

    /// Sum of the nets of every period of an account.
    #[must_use]
    pub fn net_for(&self, account_id: AccountId) -> Decimal {
        self.periods
            .iter()
            .filter(|(key, _)| key.account_id == account_id)
            .map(|(_, totals)| totals.net)
            .sum()
    }
}
