//! Journal entry domain types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use partida_shared::types::{AccountId, EntryId, TenantId};

use super::balance::Movement;
use super::types::{EntryStatus, EntryTotals};

/// A stored journal line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedLine {
    /// 1-based position within the entry.
    pub item: i32,
    /// Posted account.
    pub account_id: AccountId,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Optional note.
    pub note: Option<String>,
}

impl PostedLine {
    /// Returns `debit - credit`.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.debit - self.credit
    }
}

/// A stored journal entry with its lines in item order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedEntry {
    /// Entry ID.
    pub id: EntryId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Sequential number within the tenant.
    pub number: i32,
    /// Entry date.
    pub date: NaiveDate,
    /// Global description.
    pub description: Option<String>,
    /// Whether this is an opening entry.
    pub is_opening: bool,
    /// Current status.
    pub status: EntryStatus,
    /// Lines ordered by item.
    pub lines: Vec<PostedLine>,
}

impl PostedEntry {
    /// Debit and credit totals of the lines.
    #[must_use]
    pub fn totals(&self) -> EntryTotals {
        let mut totals = EntryTotals::default();
        for line in &self.lines {
            totals.add(line.debit, line.credit);
        }
        totals
    }

    /// Returns true if the lines balance within `tolerance`.
    #[must_use]
    pub fn is_balanced(&self, tolerance: Decimal) -> bool {
        self.totals().is_balanced(tolerance)
    }

    /// The lines as balance movements dated at the entry date.
    #[must_use]
    pub fn movements(&self) -> Vec<Movement> {
        self.lines
            .iter()
            .map(|line| Movement {
                account_id: line.account_id,
                date: self.date,
                entry_number: self.number,
                debit: line.debit,
                credit: line.credit,
            })
            .collect()
    }
}

/// Returns the number following the highest one used by a tenant.
///
/// Numbering starts at 1. Numbers of voided entries stay taken.
#[must_use]
pub fn next_number(current_max: Option<i32>) -> i32 {
    current_max.map_or(1, |max| max.saturating_add(1))
}
