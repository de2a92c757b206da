//! Core ledger logic for Partida.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `chart` - Chart of accounts and its code hierarchy
//! - `fiscal` - Fiscal years
//! - `ledger` - Double-entry bookkeeping logic and period balances
//! - `inflation` - Index-based restatement and the REI entry
//! - `reports` - Journal, ledger, trial balance and hierarchical balance

pub mod chart;
pub mod fiscal;
pub mod inflation;
pub mod ledger;
pub mod reports;
