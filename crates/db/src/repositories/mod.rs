//! Repositories over the ledger tables.
//!
//! Each repository owns a `DatabaseConnection` and exposes one component of
//! the ledger: the chart of accounts, fiscal years, the journal engine, the
//! period balance store, the inflation adjustment engine and the reports.

pub mod account;
pub mod balance;
pub mod fiscal;
pub mod inflation;
pub mod journal;
pub mod report;

mod support;

pub use account::{AccountError, AccountRepository, CreateAccountInput};
pub use balance::{BalanceError, BalanceRepository, RecomputeSummary};
pub use fiscal::{CreateFiscalYearInput, FiscalError, FiscalRepository};
pub use inflation::{AdjustmentPosting, InflationError, InflationRepository};
pub use journal::{EntryView, JournalError, JournalRepository};
pub use report::{ReportQueryError, ReportRepository};
