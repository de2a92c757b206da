//! Ledger domain types for journal entry creation and validation.
//!
//! This module defines the types used when creating, amending and voiding
//! journal entries in the double-entry bookkeeping system.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use partida_shared::types::{AccountId, TenantId, UserId};

/// Journal entry status.
///
/// `ACTIVE -> VOID` is the only transition and it is irreversible.
/// Amending keeps an entry `ACTIVE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryStatus {
    /// Entry counts towards balances.
    Active,
    /// Entry was voided and no longer counts towards balances.
    Void,
}

impl EntryStatus {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Void => "VOID",
        }
    }

    /// Returns true if the entry content can be replaced.
    #[must_use]
    pub fn can_amend(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns true if the entry can be voided.
    #[must_use]
    pub fn can_void(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Input for a single journal line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDraft {
    /// The account to post to.
    pub account_id: AccountId,
    /// Debit amount (zero when the line is a credit).
    pub debit: Decimal,
    /// Credit amount (zero when the line is a debit).
    pub credit: Decimal,
    /// Optional free-text note.
    pub note: Option<String>,
}

impl LineDraft {
    /// Creates a debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Decimal::ZERO,
            note: None,
        }
    }

    /// Creates a credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: Decimal::ZERO,
            credit: amount,
            note: None,
        }
    }

    /// Attaches a note to the line.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Returns `debit - credit`.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.debit - self.credit
    }
}

/// Input for creating a journal entry.
#[derive(Debug, Clone)]
pub struct CreateEntryInput {
    /// Tenant the entry is booked in.
    pub tenant_id: TenantId,
    /// Entry date.
    pub date: NaiveDate,
    /// Global description.
    pub description: Option<String>,
    /// Whether this is an opening entry.
    pub is_opening: bool,
    /// Lines in posting order (must have at least 1).
    pub lines: Vec<LineDraft>,
    /// User creating the entry.
    pub created_by: Option<UserId>,
}

/// Input for amending an active journal entry.
#[derive(Debug, Clone)]
pub struct AmendEntryInput {
    /// New entry date.
    pub date: NaiveDate,
    /// New global description.
    pub description: Option<String>,
    /// Replacement lines.
    pub lines: Vec<LineDraft>,
    /// User amending the entry.
    pub amended_by: Option<UserId>,
}

/// Debit and credit totals of a set of lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTotals {
    /// Sum of debits.
    pub debit: Decimal,
    /// Sum of credits.
    pub credit: Decimal,
}

impl EntryTotals {
    /// Adds one line to the totals.
    pub fn add(&mut self, debit: Decimal, credit: Decimal) {
        self.debit += debit;
        self.credit += credit;
    }

    /// Returns `debit - credit`.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.debit - self.credit
    }

    /// Returns true if the totals agree within `tolerance`.
    #[must_use]
    pub fn is_balanced(&self, tolerance: Decimal) -> bool {
        self.difference().abs() <= tolerance
    }
}

impl<'a> FromIterator<&'a LineDraft> for EntryTotals {
    fn from_iter<I: IntoIterator<Item = &'a LineDraft>>(iter: I) -> Self {
        let mut totals = Self::default();
        for line in iter {
            totals.add(line.debit, line.credit);
        }
        totals
    }
}
