//! Inflation adjustment engine.
//!
//! Index tables are reference data keyed by (tenant, table code, year).
//! Adjustments are computed from the active journal and, when posted, go
//! through the journal engine like any other entry.

use chrono::NaiveDate;
use partida_core::chart::Account;
use partida_core::inflation::{
    AccountAdjustment, GeneralAdjustment, IndexSeries, IndexTable, account_adjustment,
    adjustment_description, adjustment_lines, general_adjustment,
};
use partida_core::ledger::{CreateEntryInput, Movement, PostedEntry};
use partida_shared::types::{AccountId, TenantId, UserId};
use partida_shared::{AppError, LedgerConfig};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::journal::{JournalError, create_in};
use super::support::{
    PostingScope, begin_serializable, begin_snapshot, is_retryable, load_accounts, load_postings,
    with_retry,
};
use crate::entities::inflation_indices;

/// Error types for inflation operations.
#[derive(Debug, thiserror::Error)]
pub enum InflationError {
    /// Posting the adjustment entry failed.
    #[error(transparent)]
    Journal(#[from] JournalError),

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl InflationError {
    /// Returns true when another attempt may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Journal(err) => err.is_retryable(),
            Self::Database(err) => is_retryable(err),
            Self::AccountNotFound(_) => false,
        }
    }
}

impl From<InflationError> for AppError {
    fn from(err: InflationError) -> Self {
        match err {
            InflationError::Journal(e) => e.into(),
            InflationError::AccountNotFound(id) => Self::NotFound(format!("account {id}")),
            InflationError::Database(e) if is_retryable(&e) => Self::Conflict(e.to_string()),
            InflationError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Outcome of [`InflationRepository::adjust_and_post`].
#[derive(Debug, Clone, Serialize)]
pub struct AdjustmentPosting {
    /// The figures the entry was built from.
    pub adjustment: GeneralAdjustment,
    /// The posted entry, `None` when nothing needed adjusting.
    pub entry: Option<PostedEntry>,
}

async fn load_series<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    table: &str,
) -> Result<IndexSeries, DbErr> {
    let rows = inflation_indices::Entity::find()
        .filter(inflation_indices::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(inflation_indices::Column::TableCode.eq(table))
        .all(conn)
        .await?;

    Ok(IndexSeries::new(rows.into_iter().map(IndexTable::from)))
}

async fn load_movements<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    account_id: Option<AccountId>,
    as_of: NaiveDate,
) -> Result<Vec<Movement>, DbErr> {
    let scope = PostingScope {
        account_id,
        from: None,
        to: Some(as_of),
    };
    let postings = load_postings(conn, tenant_id, scope).await?;
    Ok(postings.iter().map(|p| p.movement()).collect())
}

async fn compute_general<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    as_of: NaiveDate,
    table: &str,
) -> Result<GeneralAdjustment, DbErr> {
    let accounts: Vec<Account> = load_accounts(conn, tenant_id)
        .await?
        .into_iter()
        .filter(Account::is_inflation_candidate)
        .collect();
    let movements = load_movements(conn, tenant_id, None, as_of).await?;
    let series = load_series(conn, tenant_id, table).await?;

    Ok(general_adjustment(&accounts, &movements, as_of, table, &series))
}

async fn post_in<C: ConnectionTrait>(
    conn: &C,
    ledger: &LedgerConfig,
    tenant_id: TenantId,
    date: NaiveDate,
    adjustment: &GeneralAdjustment,
    rei_account: AccountId,
    actor: Option<UserId>,
) -> Result<Option<PostedEntry>, JournalError> {
    let Some(lines) = adjustment_lines(adjustment, rei_account) else {
        return Ok(None);
    };

    let input = CreateEntryInput {
        tenant_id,
        date,
        description: Some(adjustment_description(adjustment.as_of)),
        is_opening: false,
        lines,
        created_by: actor,
    };
    create_in(conn, ledger, &input).await.map(Some)
}

fn with_values(
    mut model: inflation_indices::ActiveModel,
    values: &[Option<Decimal>; 12],
) -> inflation_indices::ActiveModel {
    model.index_01 = Set(values[0]);
    model.index_02 = Set(values[1]);
    model.index_03 = Set(values[2]);
    model.index_04 = Set(values[3]);
    model.index_05 = Set(values[4]);
    model.index_06 = Set(values[5]);
    model.index_07 = Set(values[6]);
    model.index_08 = Set(values[7]);
    model.index_09 = Set(values[8]);
    model.index_10 = Set(values[9]);
    model.index_11 = Set(values[10]);
    model.index_12 = Set(values[11]);
    model
}

/// Inflation adjustment repository.
#[derive(Debug, Clone)]
pub struct InflationRepository {
    db: DatabaseConnection,
    ledger: LedgerConfig,
}

impl InflationRepository {
    /// Creates a new inflation repository with default ledger settings.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_config(db, LedgerConfig::default())
    }

    /// Creates a new inflation repository.
    #[must_use]
    pub const fn with_config(db: DatabaseConnection, ledger: LedgerConfig) -> Self {
        Self { db, ledger }
    }

    fn table_or_default<'a>(&'a self, table: Option<&'a str>) -> &'a str {
        table.unwrap_or(&self.ledger.default_inflation_table)
    }

    /// Inserts or replaces one year of an index table.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn upsert_table(
        &self,
        tenant_id: TenantId,
        table: IndexTable,
    ) -> Result<IndexTable, InflationError> {
        let txn = self.db.begin().await?;

        let existing = inflation_indices::Entity::find()
            .filter(inflation_indices::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(inflation_indices::Column::TableCode.eq(&table.code))
            .filter(inflation_indices::Column::Year.eq(table.year))
            .one(&txn)
            .await?;

        let row = if let Some(row) = existing {
            let mut active: inflation_indices::ActiveModel = row.into();
            active.title = Set(table.title.clone());
            with_values(active, &table.values).update(&txn).await?
        } else {
            let active = inflation_indices::ActiveModel {
                id: Set(Uuid::now_v7()),
                tenant_id: Set(tenant_id.into_inner()),
                table_code: Set(table.code.clone()),
                year: Set(table.year),
                title: Set(table.title.clone()),
                ..Default::default()
            };
            with_values(active, &table.values).insert(&txn).await?
        };

        txn.commit().await?;

        info!(tenant_id = %tenant_id, table = %row.table_code, year = row.year, "index table stored");
        Ok(row.into())
    }

    /// Looks up one monthly index. Missing and zero values are `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn index_at(
        &self,
        tenant_id: TenantId,
        table: &str,
        year: i32,
        month: u32,
    ) -> Result<Option<Decimal>, InflationError> {
        let row = inflation_indices::Entity::find()
            .filter(inflation_indices::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(inflation_indices::Column::TableCode.eq(table))
            .filter(inflation_indices::Column::Year.eq(year))
            .one(&self.db)
            .await?;

        Ok(row.and_then(|row| IndexTable::from(row).index(month)))
    }

    /// Restatement factor `index(dest) / index(origin)`, `None` when either
    /// index is missing or the origin is not positive.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn factor(
        &self,
        tenant_id: TenantId,
        table: &str,
        origin: (i32, u32),
        dest: (i32, u32),
    ) -> Result<Option<Decimal>, InflationError> {
        let series = load_series(&self.db, tenant_id, table).await?;
        Ok(series.factor(origin, dest))
    }

    /// Restates one account to the month of `as_of`.
    ///
    /// Returns `None` when the account is not an adjustment candidate or
    /// has no movement up to `as_of`.
    ///
    /// # Errors
    ///
    /// Returns `InflationError::AccountNotFound` or a database error.
    pub async fn account_adjustment(
        &self,
        tenant_id: TenantId,
        account_id: AccountId,
        as_of: NaiveDate,
        table: Option<&str>,
    ) -> Result<Option<AccountAdjustment>, InflationError> {
        let table = self.table_or_default(table);
        let txn = begin_snapshot(&self.db).await?;

        let account = load_accounts(&txn, tenant_id)
            .await?
            .into_iter()
            .find(|a| a.id == account_id)
            .ok_or(InflationError::AccountNotFound(account_id.into_inner()))?;
        let movements = load_movements(&txn, tenant_id, Some(account_id), as_of).await?;
        let series = load_series(&txn, tenant_id, table).await?;

        txn.commit().await?;
        Ok(account_adjustment(&account, &movements, as_of, &series))
    }

    /// Runs the account adjustment over every candidate account.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub async fn general_adjustment(
        &self,
        tenant_id: TenantId,
        as_of: NaiveDate,
        table: Option<&str>,
    ) -> Result<GeneralAdjustment, InflationError> {
        let table = self.table_or_default(table);
        let txn = begin_snapshot(&self.db).await?;
        let adjustment = compute_general(&txn, tenant_id, as_of, table).await?;
        txn.commit().await?;
        Ok(adjustment)
    }

    /// Posts the adjustment entry for previously computed figures.
    ///
    /// The figures should come from a `general_adjustment` run just before
    /// this call; [`Self::adjust_and_post`] does both atomically. Returns
    /// `None` when there is nothing to post.
    ///
    /// # Errors
    ///
    /// Returns a journal error if the entry is rejected or cannot be written.
    pub async fn post_adjustment_entry(
        &self,
        tenant_id: TenantId,
        date: NaiveDate,
        adjustment: &GeneralAdjustment,
        rei_account: AccountId,
        actor: Option<UserId>,
    ) -> Result<Option<PostedEntry>, InflationError> {
        let entry = with_retry(
            self.ledger.retry_attempts,
            "post_adjustment_entry",
            JournalError::is_retryable,
            || self.try_post(tenant_id, date, adjustment, rei_account, actor),
        )
        .await?;

        log_posting(tenant_id, adjustment, entry.as_ref());
        Ok(entry)
    }

    async fn try_post(
        &self,
        tenant_id: TenantId,
        date: NaiveDate,
        adjustment: &GeneralAdjustment,
        rei_account: AccountId,
        actor: Option<UserId>,
    ) -> Result<Option<PostedEntry>, JournalError> {
        let txn = begin_serializable(&self.db).await?;
        let entry = post_in(&txn, &self.ledger, tenant_id, date, adjustment, rei_account, actor)
            .await?;
        txn.commit().await?;
        Ok(entry)
    }

    /// Computes the general adjustment as of `as_of` and posts it on that
    /// date, both inside one transaction.
    ///
    /// # Errors
    ///
    /// Returns a journal error if the entry is rejected, or a database error.
    pub async fn adjust_and_post(
        &self,
        tenant_id: TenantId,
        as_of: NaiveDate,
        table: Option<&str>,
        rei_account: AccountId,
        actor: Option<UserId>,
    ) -> Result<AdjustmentPosting, InflationError> {
        let table = self.table_or_default(table);
        let posting = with_retry(
            self.ledger.retry_attempts,
            "adjust_and_post",
            InflationError::is_retryable,
            || self.try_adjust_and_post(tenant_id, as_of, table, rei_account, actor),
        )
        .await?;

        log_posting(tenant_id, &posting.adjustment, posting.entry.as_ref());
        Ok(posting)
    }

    async fn try_adjust_and_post(
        &self,
        tenant_id: TenantId,
        as_of: NaiveDate,
        table: &str,
        rei_account: AccountId,
        actor: Option<UserId>,
    ) -> Result<AdjustmentPosting, InflationError> {
        let txn = begin_serializable(&self.db).await?;
        let adjustment = compute_general(&txn, tenant_id, as_of, table).await?;
        let entry = post_in(&txn, &self.ledger, tenant_id, as_of, &adjustment, rei_account, actor)
            .await?;
        txn.commit().await?;

        Ok(AdjustmentPosting { adjustment, entry })
    }
}

fn log_posting(tenant_id: TenantId, adjustment: &GeneralAdjustment, entry: Option<&PostedEntry>) {
    match entry {
        Some(entry) => info!(
            tenant_id = %tenant_id,
            number = entry.number,
            lines = entry.lines.len(),
            rei = %adjustment.rei,
            as_of = %adjustment.as_of,
            "inflation adjustment posted"
        ),
        None => info!(tenant_id = %tenant_id, "no inflation adjustment to post"),
    }
}
