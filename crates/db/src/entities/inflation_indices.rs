//! `SeaORM` Entity for inflation_indices table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "inflation_indices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub table_code: String,
    pub year: i32,
    pub title: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 6)))", nullable)]
    pub index_01: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 6)))", nullable)]
    pub index_02: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 6)))", nullable)]
    pub index_03: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 6)))", nullable)]
    pub index_04: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 6)))", nullable)]
    pub index_05: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 6)))", nullable)]
    pub index_06: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 6)))", nullable)]
    pub index_07: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 6)))", nullable)]
    pub index_08: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 6)))", nullable)]
    pub index_09: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 6)))", nullable)]
    pub index_10: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 6)))", nullable)]
    pub index_11: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 6)))", nullable)]
    pub index_12: Option<Decimal>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Monthly values, January first.
    #[must_use]
    pub fn values(&self) -> [Option<Decimal>; 12] {
        [
            self.index_01,
            self.index_02,
            self.index_03,
            self.index_04,
            self.index_05,
            self.index_06,
            self.index_07,
            self.index_08,
            self.index_09,
            self.index_10,
            self.index_11,
            self.index_12,
        ]
    }
}

impl From<Model> for partida_core::inflation::IndexTable {
    fn from(model: Model) -> Self {
        let values = model.values();
        Self {
            code: model.table_code,
            year: model.year,
            title: model.title,
            values,
        }
    }
}
