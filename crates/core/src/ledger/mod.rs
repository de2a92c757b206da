//! Double-entry bookkeeping logic.
//!
//! This module implements the core ledger functionality:
//! - Journal entry and line types
//! - Entry status machine (`ACTIVE -> VOID`)
//! - Line validation and the balance tolerance
//! - Period balance arithmetic and replay
//! - Fiscal year posting rules
//! - Entry numbering

pub mod balance;
pub mod entry;
pub mod error;
pub mod fiscal;
pub mod types;
pub mod validation;

#[cfg(test)]
mod balance_props;
#[cfg(test)]
mod validation_props;

pub use balance::{BalanceBook, CachedBalance, Movement, PeriodKey, PeriodTotals};
pub use entry::{next_number, PostedEntry, PostedLine};
pub use error::ValidationError;
pub use fiscal::ensure_year_open;
pub use types::{AmendEntryInput, CreateEntryInput, EntryStatus, EntryTotals, LineDraft};
pub use validation::{validate_entry, validate_lines};
