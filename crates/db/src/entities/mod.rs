//! `SeaORM` entities for the ledger tables.

pub mod prelude;

pub mod accounts;
pub mod fiscal_years;
pub mod inflation_indices;
pub mod journal_entries;
pub mod journal_lines;
pub mod period_balances;
pub mod sea_orm_active_enums;
