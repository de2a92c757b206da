//! Ledger schema: chart of accounts, fiscal years, journal and period balances.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Accounts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Accounts::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Accounts::Code).string_len(32).not_null())
                    .col(ColumnDef::new(Accounts::Name).string_len(200).not_null())
                    .col(ColumnDef::new(Accounts::Level).integer().not_null())
                    .col(ColumnDef::new(Accounts::Postable).boolean().not_null())
                    .col(ColumnDef::new(Accounts::Monetary).boolean().not_null())
                    .col(ColumnDef::new(Accounts::Adjustable).boolean().not_null())
                    .col(ColumnDef::new(Accounts::BalanceSide).string_len(8).not_null())
                    .col(
                        ColumnDef::new(Accounts::LastBalance)
                            .decimal_len(19, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Accounts::LastMovement).date().null())
                    .col(
                        ColumnDef::new(Accounts::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Accounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Accounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_accounts_tenant_code")
                    .table(Accounts::Table)
                    .col(Accounts::TenantId)
                    .col(Accounts::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FiscalYears::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(FiscalYears::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(FiscalYears::TenantId).uuid().not_null())
                    .col(ColumnDef::new(FiscalYears::Year).integer().not_null())
                    .col(ColumnDef::new(FiscalYears::StartDate).date().not_null())
                    .col(ColumnDef::new(FiscalYears::EndDate).date().not_null())
                    .col(
                        ColumnDef::new(FiscalYears::Closed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_fiscal_years_tenant_year")
                    .table(FiscalYears::Table)
                    .col(FiscalYears::TenantId)
                    .col(FiscalYears::Year)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JournalEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JournalEntries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(JournalEntries::TenantId).uuid().not_null())
                    .col(ColumnDef::new(JournalEntries::Number).integer().not_null())
                    .col(ColumnDef::new(JournalEntries::EntryDate).date().not_null())
                    .col(ColumnDef::new(JournalEntries::Description).text().null())
                    .col(
                        ColumnDef::new(JournalEntries::IsOpening)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(JournalEntries::Status).string_len(8).not_null())
                    .col(ColumnDef::new(JournalEntries::CreatedBy).uuid().null())
                    .col(
                        ColumnDef::new(JournalEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JournalEntries::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JournalEntries::VoidedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(JournalEntries::VoidedBy).uuid().null())
                    .to_owned(),
            )
            .await?;

        // Entry numbers are never reused within a tenant
        manager
            .create_index(
                Index::create()
                    .name("uq_journal_entries_tenant_number")
                    .table(JournalEntries::Table)
                    .col(JournalEntries::TenantId)
                    .col(JournalEntries::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_journal_entries_tenant_date")
                    .table(JournalEntries::Table)
                    .col(JournalEntries::TenantId)
                    .col(JournalEntries::EntryDate)
                    .col(JournalEntries::Number)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JournalLines::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(JournalLines::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(JournalLines::EntryId).uuid().not_null())
                    .col(ColumnDef::new(JournalLines::Item).integer().not_null())
                    .col(ColumnDef::new(JournalLines::AccountId).uuid().not_null())
                    .col(
                        ColumnDef::new(JournalLines::Debit)
                            .decimal_len(19, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(JournalLines::Credit)
                            .decimal_len(19, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(JournalLines::Note).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_journal_lines_entry")
                            .from(JournalLines::Table, JournalLines::EntryId)
                            .to(JournalEntries::Table, JournalEntries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_journal_lines_account")
                            .from(JournalLines::Table, JournalLines::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_journal_lines_entry_item")
                    .table(JournalLines::Table)
                    .col(JournalLines::EntryId)
                    .col(JournalLines::Item)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_journal_lines_account")
                    .table(JournalLines::Table)
                    .col(JournalLines::AccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PeriodBalances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PeriodBalances::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PeriodBalances::TenantId).uuid().not_null())
                    .col(ColumnDef::new(PeriodBalances::AccountId).uuid().not_null())
                    .col(ColumnDef::new(PeriodBalances::Year).integer().not_null())
                    .col(ColumnDef::new(PeriodBalances::Month).integer().not_null())
                    .col(
                        ColumnDef::new(PeriodBalances::DebitTotal)
                            .decimal_len(19, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PeriodBalances::CreditTotal)
                            .decimal_len(19, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PeriodBalances::Net)
                            .decimal_len(19, 4)
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_period_balances_account")
                            .from(PeriodBalances::Table, PeriodBalances::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One row per account and month, created lazily by the first movement
        manager
            .create_index(
                Index::create()
                    .name("uq_period_balances_account_period")
                    .table(PeriodBalances::Table)
                    .col(PeriodBalances::TenantId)
                    .col(PeriodBalances::AccountId)
                    .col(PeriodBalances::Year)
                    .col(PeriodBalances::Month)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PeriodBalances::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JournalLines::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JournalEntries::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FiscalYears::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
    TenantId,
    Code,
    Name,
    Level,
    Postable,
    Monetary,
    Adjustable,
    BalanceSide,
    LastBalance,
    LastMovement,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum FiscalYears {
    Table,
    Id,
    TenantId,
    Year,
    StartDate,
    EndDate,
    Closed,
}

#[derive(DeriveIden)]
enum JournalEntries {
    Table,
    Id,
    TenantId,
    Number,
    EntryDate,
    Description,
    IsOpening,
    Status,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
    VoidedAt,
    VoidedBy,
}

#[derive(DeriveIden)]
enum JournalLines {
    Table,
    Id,
    EntryId,
    Item,
    AccountId,
    Debit,
    Credit,
    Note,
}

#[derive(DeriveIden)]
enum PeriodBalances {
    Table,
    Id,
    TenantId,
    AccountId,
    Year,
    Month,
    DebitTotal,
    CreditTotal,
    Net,
}
