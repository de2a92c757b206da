//! String-backed enums stored in ledger tables.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Journal entry status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum EntryStatus {
    /// Counts towards balances.
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    /// Voided.
    #[sea_orm(string_value = "VOID")]
    Void,
}

/// Natural balance side of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum BalanceSide {
    /// Debit-natured.
    #[sea_orm(string_value = "DEBIT")]
    Debit,
    /// Credit-natured.
    #[sea_orm(string_value = "CREDIT")]
    Credit,
}

impl From<EntryStatus> for partida_core::ledger::EntryStatus {
    fn from(status: EntryStatus) -> Self {
        match status {
            EntryStatus::Active => Self::Active,
            EntryStatus::Void => Self::Void,
        }
    }
}

impl From<BalanceSide> for partida_core::chart::BalanceSide {
    fn from(side: BalanceSide) -> Self {
        match side {
            BalanceSide::Debit => Self::Debit,
            BalanceSide::Credit => Self::Credit,
        }
    }
}

impl From<partida_core::chart::BalanceSide> for BalanceSide {
    fn from(side: partida_core::chart::BalanceSide) -> Self {
        match side {
            partida_core::chart::BalanceSide::Debit => Self::Debit,
            partida_core::chart::BalanceSide::Credit => Self::Credit,
        }
    }
}
