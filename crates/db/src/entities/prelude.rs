//! Entity re-exports.

pub use super::accounts::Entity as Accounts;
pub use super::fiscal_years::Entity as FiscalYears;
pub use super::inflation_indices::Entity as InflationIndices;
pub use super::journal_entries::Entity as JournalEntries;
pub use super::journal_lines::Entity as JournalLines;
pub use super::period_balances::Entity as PeriodBalances;
