//! Reporting engine.
//!
//! Every report reads the chart and the active journal inside one read-only
//! snapshot transaction and hands the rows to the pure builders in
//! `partida_core::reports`.

use std::collections::HashMap;

use chrono::NaiveDate;
use partida_core::chart::{Account, AccountTree};
use partida_core::ledger::PostedEntry;
use partida_core::reports::{
    BalanceGeneralReport, CodeRange, JournalListing, LedgerReport, ReportError, ReportService,
    TrialBalanceReport,
};
use partida_shared::AppError;
use partida_shared::types::TenantId;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use tracing::debug;
use uuid::Uuid;

use super::journal::to_posted;
use super::support::{PostingScope, begin_snapshot, load_accounts, load_postings};
use crate::entities::{journal_entries, journal_lines, sea_orm_active_enums::EntryStatus};

/// Error types for report queries.
#[derive(Debug, thiserror::Error)]
pub enum ReportQueryError {
    /// The report could not be built from the stored rows.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ReportQueryError> for AppError {
    fn from(err: ReportQueryError) -> Self {
        match err {
            ReportQueryError::Report(ReportError::InvalidDateRange { start, end }) => {
                Self::Validation(format!("invalid date range {start} - {end}"))
            }
            ReportQueryError::Report(e) => Self::Internal(e.to_string()),
            ReportQueryError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

async fn load_active_entries<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<PostedEntry>, DbErr> {
    let headers = journal_entries::Entity::find()
        .filter(journal_entries::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(journal_entries::Column::Status.eq(EntryStatus::Active))
        .filter(journal_entries::Column::EntryDate.gte(from))
        .filter(journal_entries::Column::EntryDate.lte(to))
        .order_by_asc(journal_entries::Column::EntryDate)
        .order_by_asc(journal_entries::Column::Number)
        .all(conn)
        .await?;
    if headers.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = headers.iter().map(|h| h.id).collect();
    let mut lines_by_entry: HashMap<Uuid, Vec<journal_lines::Model>> = HashMap::new();
    for line in journal_lines::Entity::find()
        .filter(journal_lines::Column::EntryId.is_in(ids))
        .order_by_asc(journal_lines::Column::Item)
        .all(conn)
        .await?
    {
        lines_by_entry.entry(line.entry_id).or_default().push(line);
    }

    Ok(headers
        .into_iter()
        .map(|header| {
            let lines = lines_by_entry.remove(&header.id).unwrap_or_default();
            to_posted(header, lines)
        })
        .collect())
}

/// Report repository.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: DatabaseConnection,
}

impl ReportRepository {
    /// Creates a new report repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Active entries dated inside `[from, to]` with their lines, entry
    /// totals and grand totals.
    ///
    /// # Errors
    ///
    /// Returns an error for an inverted range or a failed query.
    pub async fn journal_listing(
        &self,
        tenant_id: TenantId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<JournalListing, ReportQueryError> {
        let txn = begin_snapshot(&self.db).await?;
        let accounts: HashMap<_, Account> = load_accounts(&txn, tenant_id)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();
        let entries = load_active_entries(&txn, tenant_id, from, to).await?;
        txn.commit().await?;

        debug!(tenant_id = %tenant_id, entries = entries.len(), "building journal listing");
        Ok(ReportService::journal_listing(from, to, entries, &accounts)?)
    }

    /// Ledger of every active postable account whose code lies in `codes`
    /// and that moved inside `[from, to]`.
    ///
    /// # Errors
    ///
    /// Returns an error for an inverted range or a failed query.
    pub async fn ledger_by_account(
        &self,
        tenant_id: TenantId,
        from: NaiveDate,
        to: NaiveDate,
        codes: &CodeRange,
    ) -> Result<LedgerReport, ReportQueryError> {
        let txn = begin_snapshot(&self.db).await?;
        let accounts = load_accounts(&txn, tenant_id).await?;
        let scope = PostingScope {
            to: Some(to),
            ..PostingScope::default()
        };
        let postings = load_postings(&txn, tenant_id, scope).await?;
        txn.commit().await?;

        Ok(ReportService::ledger_by_account(
            from, to, codes, &accounts, &postings,
        )?)
    }

    /// Trial balance of the active postable accounts over `[from, to]`;
    /// `from = None` starts at the first entry.
    ///
    /// # Errors
    ///
    /// Returns an error for an inverted range or a failed query.
    pub async fn trial_balance(
        &self,
        tenant_id: TenantId,
        from: Option<NaiveDate>,
        to: NaiveDate,
        include_empty: bool,
    ) -> Result<TrialBalanceReport, ReportQueryError> {
        let txn = begin_snapshot(&self.db).await?;
        let accounts = load_accounts(&txn, tenant_id).await?;
        let scope = PostingScope {
            from,
            to: Some(to),
            ..PostingScope::default()
        };
        let postings = load_postings(&txn, tenant_id, scope).await?;
        txn.commit().await?;

        Ok(ReportService::trial_balance(
            from,
            to,
            &accounts,
            &postings,
            include_empty,
        )?)
    }

    /// Hierarchical balance over `[from, to]`. Inactive accounts are left
    /// out of the hierarchy.
    ///
    /// # Errors
    ///
    /// Returns an error for an inverted range or a failed query.
    pub async fn balance_general(
        &self,
        tenant_id: TenantId,
        from: Option<NaiveDate>,
        to: NaiveDate,
    ) -> Result<BalanceGeneralReport, ReportQueryError> {
        let txn = begin_snapshot(&self.db).await?;
        let active = load_accounts(&txn, tenant_id)
            .await?
            .into_iter()
            .filter(|account| account.is_active)
            .collect();
        let tree = AccountTree::new(active);
        let scope = PostingScope {
            from,
            to: Some(to),
            ..PostingScope::default()
        };
        let postings = load_postings(&txn, tenant_id, scope).await?;
        txn.commit().await?;

        Ok(ReportService::balance_general(from, to, &tree, &postings)?)
    }
}
