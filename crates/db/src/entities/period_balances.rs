//! `SeaORM` Entity for period_balances table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "period_balances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub account_id: Uuid,
    pub year: i32,
    pub month: i32,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub debit_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub credit_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub net: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Model> for partida_core::ledger::PeriodTotals {
    fn from(model: &Model) -> Self {
        Self {
            debit_total: model.debit_total,
            credit_total: model.credit_total,
            net: model.net,
        }
    }
}
