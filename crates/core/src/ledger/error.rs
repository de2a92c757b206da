//! Ledger validation errors.
//!
//! Every variant is a caller-correctable reason for rejecting a journal
//! operation. Line numbers are 1-based positions in the submitted line list.

use rust_decimal::Decimal;
use thiserror::Error;
use partida_shared::types::AccountId;

/// Errors that reject a create, amend or void request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    // ========== Line Errors ==========
    /// Entry has no lines.
    #[error("Entry must have at least one line")]
    NoLines,

    /// Account does not exist in the tenant.
    #[error("Line {line}: account {account_id} not found")]
    AccountNotFound {
        /// Line number.
        line: usize,
        /// Referenced account.
        account_id: AccountId,
    },

    /// Account does not accept postings.
    #[error("Line {line}: account {code} is not postable")]
    AccountNotPostable {
        /// Line number.
        line: usize,
        /// Account code.
        code: String,
    },

    /// Account is inactive.
    #[error("Line {line}: account {code} is inactive")]
    AccountInactive {
        /// Line number.
        line: usize,
        /// Account code.
        code: String,
    },

    /// Debit or credit is negative.
    #[error("Line {line}: amounts cannot be negative")]
    NegativeAmount {
        /// Line number.
        line: usize,
    },

    /// Neither debit nor credit is positive.
    #[error("Line {line}: a debit or a credit amount is required")]
    EmptyLine {
        /// Line number.
        line: usize,
    },

    /// Debit and credit are both positive.
    #[error("Line {line}: cannot carry both a debit and a credit")]
    BothSides {
        /// Line number.
        line: usize,
    },

    // ========== Entry Errors ==========
    /// Debits and credits differ by more than the tolerance.
    #[error("Entry is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debit.
        debit: Decimal,
        /// Total credit.
        credit: Decimal,
    },

    /// Entry moves no money at all.
    #[error("Entry total cannot be zero")]
    ZeroEntry,

    /// Date falls in a closed fiscal year.
    #[error("Fiscal year {year} is closed")]
    FiscalYearClosed {
        /// Fiscal year number.
        year: i32,
    },

    // ========== State Errors ==========
    /// Amend requested on a voided entry.
    #[error("Cannot amend a void entry")]
    CannotAmendVoid,

    /// Void requested on an entry that is already void.
    #[error("Entry is already void")]
    AlreadyVoid,
}

impl ValidationError {
    /// Returns a stable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoLines => "NO_LINES",
            Self::AccountNotFound { .. } => "ACCOUNT_NOT_FOUND",
            Self::AccountNotPostable { .. } => "ACCOUNT_NOT_POSTABLE",
            Self::AccountInactive { .. } => "ACCOUNT_INACTIVE",
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::EmptyLine { .. } => "EMPTY_LINE",
            Self::BothSides { .. } => "BOTH_SIDES",
            Self::Unbalanced { .. } => "UNBALANCED_ENTRY",
            Self::ZeroEntry => "ZERO_ENTRY",
            Self::FiscalYearClosed { .. } => "FISCAL_YEAR_CLOSED",
            Self::CannotAmendVoid => "CANNOT_AMEND_VOID",
            Self::AlreadyVoid => "ALREADY_VOID",
        }
    }

    /// Returns the offending line number, if the error is line-scoped.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::AccountNotFound { line, .. }
            | Self::AccountNotPostable { line, .. }
            | Self::AccountInactive { line, .. }
            | Self::NegativeAmount { line }
            | Self::EmptyLine { line }
            | Self::BothSides { line } => Some(*line),
            _ => None,
        }
    }
}
