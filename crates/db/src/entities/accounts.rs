//! `SeaORM` Entity for accounts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::BalanceSide;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub code: String,
    pub name: String,
    pub level: i32,
    pub postable: bool,
    pub monetary: bool,
    pub adjustable: bool,
    pub balance_side: BalanceSide,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub last_balance: Decimal,
    pub last_movement: Option<Date>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::journal_lines::Entity")]
    JournalLines,
    #[sea_orm(has_many = "super::period_balances::Entity")]
    PeriodBalances,
}

impl Related<super::journal_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JournalLines.def()
    }
}

impl Related<super::period_balances::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PeriodBalances.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for partida_core::chart::Account {
    fn from(model: Model) -> Self {
        Self {
            id: model.id.into(),
            tenant_id: model.tenant_id.into(),
            code: model.code,
            name: model.name,
            level: model.level,
            postable: model.postable,
            monetary: model.monetary,
            adjustable: model.adjustable,
            balance_side: model.balance_side.into(),
            is_active: model.is_active,
        }
    }
}
