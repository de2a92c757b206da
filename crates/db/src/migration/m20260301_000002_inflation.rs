//! Inflation index tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let months = [
            InflationIndices::Index01,
            InflationIndices::Index02,
            InflationIndices::Index03,
            InflationIndices::Index04,
            InflationIndices::Index05,
            InflationIndices::Index06,
            InflationIndices::Index07,
            InflationIndices::Index08,
            InflationIndices::Index09,
            InflationIndices::Index10,
            InflationIndices::Index11,
            InflationIndices::Index12,
        ];

        let mut table = Table::create();
        table
            .table(InflationIndices::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(InflationIndices::Id)
                    .uuid()
                    .not_null()
                    .primary_key(),
            )
            .col(ColumnDef::new(InflationIndices::TenantId).uuid().not_null())
            .col(ColumnDef::new(InflationIndices::TableCode).string_len(8).not_null())
            .col(ColumnDef::new(InflationIndices::Year).integer().not_null())
            .col(ColumnDef::new(InflationIndices::Title).string_len(200).null());
        for month in months {
            table.col(ColumnDef::new(month).decimal_len(19, 6).null());
        }

        manager.create_table(table.to_owned()).await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_inflation_indices_table_year")
                    .table(InflationIndices::Table)
                    .col(InflationIndices::TenantId)
                    .col(InflationIndices::TableCode)
                    .col(InflationIndices::Year)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(InflationIndices::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum InflationIndices {
    Table,
    Id,
    TenantId,
    TableCode,
    Year,
    Title,
    #[sea_orm(iden = "index_01")]
    Index01,
    #[sea_orm(iden = "index_02")]
    Index02,
    #[sea_orm(iden = "index_03")]
    Index03,
    #[sea_orm(iden = "index_04")]
    Index04,
    #[sea_orm(iden = "index_05")]
    Index05,
    #[sea_orm(iden = "index_06")]
    Index06,
    #[sea_orm(iden = "index_07")]
    Index07,
    #[sea_orm(iden = "index_08")]
    Index08,
    #[sea_orm(iden = "index_09")]
    Index09,
    #[sea_orm(iden = "index_10")]
    Index10,
    #[sea_orm(iden = "index_11")]
    Index11,
    #[sea_orm(iden = "index_12")]
    Index12,
}
