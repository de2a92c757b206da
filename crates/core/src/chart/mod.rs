//! Chart of accounts.
//!
//! Accounts form a hierarchy encoded in their codes. The parent of `B` is
//! the account `A` with the longest code that is a strict prefix of
//! `B.code` and with `A.level < B.level`; descendants follow that parent
//! chain. Only postable accounts receive journal lines;
//! balances of non-postable accounts are always derived from their postable
//! descendants.

pub mod account;
pub mod tree;

#[cfg(test)]
mod tree_props;

pub use account::{Account, BalanceSide};
pub use tree::AccountTree;
