//! Report data types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use partida_shared::types::{AccountId, EntryId};

use crate::chart::BalanceSide;
use crate::ledger::Movement;

/// An active journal line joined with its entry header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingRecord {
    /// Entry ID.
    pub entry_id: EntryId,
    /// Entry number.
    pub entry_number: i32,
    /// Entry date.
    pub date: NaiveDate,
    /// Entry description.
    pub entry_description: Option<String>,
    /// Line position within the entry.
    pub item: i32,
    /// Posted account.
    pub account_id: AccountId,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Line note.
    pub note: Option<String>,
}

impl PostingRecord {
    /// Returns `debit - credit`.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.debit - self.credit
    }

    /// Line note, falling back to the entry description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.note
            .as_deref()
            .filter(|note| !note.trim().is_empty())
            .or(self.entry_description.as_deref())
    }

    /// The balance movement this posting contributes.
    #[must_use]
    pub fn movement(&self) -> Movement {
        Movement {
            account_id: self.account_id,
            date: self.date,
            entry_number: self.entry_number,
            debit: self.debit,
            credit: self.credit,
        }
    }
}

/// Inclusive range of account codes, compared as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRange {
    /// Lowest code, unbounded when `None`.
    pub from: Option<String>,
    /// Highest code, unbounded when `None`.
    pub to: Option<String>,
}

impl CodeRange {
    /// Returns true if `code` lies in the range.
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.from.as_deref().is_none_or(|from| code >= from)
            && self.to.as_deref().is_none_or(|to| code <= to)
    }
}

// ========== Journal listing ==========

/// A line of the journal listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalListingLine {
    /// Line position.
    pub item: i32,
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub account_code: String,
    /// Account name.
    pub account_name: String,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Line note.
    pub note: Option<String>,
}

/// An entry of the journal listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalListingEntry {
    /// Entry ID.
    pub entry_id: EntryId,
    /// Entry number.
    pub number: i32,
    /// Entry date.
    pub date: NaiveDate,
    /// Entry description.
    pub description: Option<String>,
    /// Whether this is an opening entry.
    pub is_opening: bool,
    /// Lines in item order.
    pub lines: Vec<JournalListingLine>,
    /// Total debit of the entry.
    pub total_debit: Decimal,
    /// Total credit of the entry.
    pub total_credit: Decimal,
}

/// Journal listing report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalListing {
    /// Range start.
    pub from: NaiveDate,
    /// Range end.
    pub to: NaiveDate,
    /// Entries ordered by (date, number).
    pub entries: Vec<JournalListingEntry>,
    /// Total debit over the range.
    pub total_debit: Decimal,
    /// Total credit over the range.
    pub total_credit: Decimal,
}

// ========== Ledger by account ==========

/// One movement of an account ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerMovement {
    /// Entry date.
    pub date: NaiveDate,
    /// Entry number.
    pub entry_number: i32,
    /// Line position.
    pub item: i32,
    /// Line note or entry description.
    pub description: Option<String>,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Running balance after this movement.
    pub balance: Decimal,
}

/// Ledger of one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountLedger {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Balance of every movement before the range start.
    pub opening_balance: Decimal,
    /// Movements inside the range.
    pub movements: Vec<LedgerMovement>,
    /// Total debit inside the range.
    pub total_debit: Decimal,
    /// Total credit inside the range.
    pub total_credit: Decimal,
    /// Balance after the last movement.
    pub closing_balance: Decimal,
}

/// Ledger-by-account report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerReport {
    /// Range start.
    pub from: NaiveDate,
    /// Range end.
    pub to: NaiveDate,
    /// Accounts with movements in the range, in code order.
    pub accounts: Vec<AccountLedger>,
}

// ========== Trial balance ==========

/// One account of the trial balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Total debit.
    pub total_debit: Decimal,
    /// Total credit.
    pub total_credit: Decimal,
    /// Net when it is a debit balance (saldo deudor), otherwise zero.
    pub debit_balance: Decimal,
    /// Net magnitude when it is a credit balance (saldo acreedor), otherwise zero.
    pub credit_balance: Decimal,
}

/// Trial balance totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceTotals {
    /// Total debit.
    pub total_debit: Decimal,
    /// Total credit.
    pub total_credit: Decimal,
    /// Sum of debit balances.
    pub debit_balance: Decimal,
    /// Sum of credit balances.
    pub credit_balance: Decimal,
    /// Whether debits equal credits.
    pub is_balanced: bool,
}

/// Trial balance report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceReport {
    /// Range start, `None` for the beginning of the books.
    pub from: Option<NaiveDate>,
    /// Range end.
    pub to: NaiveDate,
    /// Postable accounts in code order.
    pub rows: Vec<TrialBalanceRow>,
    /// Totals.
    pub totals: TrialBalanceTotals,
}

// ========== Balance general ==========

/// One account of the hierarchical balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceGeneralLine {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Hierarchy level.
    pub level: i32,
    /// Whether the account is postable.
    pub postable: bool,
    /// Natural balance side.
    pub balance_side: BalanceSide,
    /// `debit - credit`, rolled up for non-postable accounts.
    pub balance: Decimal,
}

/// Total of a level-1 account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopLevelTotal {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name (e.g. assets, liabilities, equity).
    pub name: String,
    /// Rolled-up `debit - credit`.
    pub balance: Decimal,
}

/// Hierarchical balance ("balance general").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceGeneralReport {
    /// Range start, `None` for the beginning of the books.
    pub from: Option<NaiveDate>,
    /// Range end.
    pub to: NaiveDate,
    /// Accounts in code order. Zero balances below level 1 are omitted.
    pub lines: Vec<BalanceGeneralLine>,
    /// Level-1 totals.
    pub top_level: Vec<TopLevelTotal>,
}
