//! Fiscal year management.

pub mod year;

pub use year::{find_covering, FiscalYear, FiscalYearError};
