//! Transaction, retry and query helpers shared by the repositories.

use std::collections::HashMap;
use std::fmt::Display;
use std::time::Duration;

use chrono::NaiveDate;
use partida_core::chart::Account;
use partida_core::fiscal::FiscalYear;
use partida_core::reports::PostingRecord;
use partida_shared::types::{AccountId, TenantId};
use sea_orm::{
    AccessMode, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, IsolationLevel, QueryFilter, QueryOrder, RuntimeErr, SqlErr, TransactionTrait,
};
use tracing::warn;

use crate::entities::{
    accounts, fiscal_years, journal_entries, journal_lines, sea_orm_active_enums::EntryStatus,
};

/// Opens the serializable transaction every ledger mutation runs in.
pub(crate) async fn begin_serializable(
    db: &DatabaseConnection,
) -> Result<DatabaseTransaction, DbErr> {
    db.begin_with_config(Some(IsolationLevel::Serializable), None)
        .await
}

/// Opens a read-only snapshot for multi-query reads.
pub(crate) async fn begin_snapshot(db: &DatabaseConnection) -> Result<DatabaseTransaction, DbErr> {
    db.begin_with_config(
        Some(IsolationLevel::RepeatableRead),
        Some(AccessMode::ReadOnly),
    )
    .await
}

/// Returns true for errors a fresh attempt can succeed on: serialization
/// failures, deadlocks and unique violations from racing inserts.
pub(crate) fn is_retryable(err: &DbErr) -> bool {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return true;
    }

    let runtime = match err {
        DbErr::Exec(e) | DbErr::Query(e) | DbErr::Conn(e) => e,
        _ => return false,
    };

    match runtime {
        RuntimeErr::SqlxError(sqlx::Error::Database(db_err)) => {
            matches!(db_err.code().as_deref(), Some("40001" | "40P01"))
        }
        _ => false,
    }
}

/// Pause before retry `n` is `n` times this.
const RETRY_BACKOFF: Duration = Duration::from_millis(5);

/// Runs `op` up to `attempts` times while it fails with a retryable error,
/// backing off a little longer before each new attempt.
pub(crate) async fn with_retry<T, E, F, Fut>(
    attempts: u32,
    operation: &'static str,
    retryable: fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Err(err) if attempt < attempts && retryable(&err) => {
                warn!(operation, attempt, error = %err, "transaction conflict, retrying");
                tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

pub(crate) fn month_column(month: u32) -> i32 {
    i32::try_from(month).unwrap_or(i32::MAX)
}

pub(crate) fn month_value(month: i32) -> u32 {
    u32::try_from(month).unwrap_or_default()
}

/// Which active postings to load.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PostingScope {
    pub account_id: Option<AccountId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Loads the lines of active entries joined with their header, ordered by
/// date, entry number and item.
pub(crate) async fn load_postings<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    scope: PostingScope,
) -> Result<Vec<PostingRecord>, DbErr> {
    let mut query = journal_lines::Entity::find()
        .find_also_related(journal_entries::Entity)
        .filter(journal_entries::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(journal_entries::Column::Status.eq(EntryStatus::Active));

    if let Some(account_id) = scope.account_id {
        query = query.filter(journal_lines::Column::AccountId.eq(account_id.into_inner()));
    }
    if let Some(from) = scope.from {
        query = query.filter(journal_entries::Column::EntryDate.gte(from));
    }
    if let Some(to) = scope.to {
        query = query.filter(journal_entries::Column::EntryDate.lte(to));
    }

    let rows = query
        .order_by_asc(journal_entries::Column::EntryDate)
        .order_by_asc(journal_entries::Column::Number)
        .order_by_asc(journal_lines::Column::Item)
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(line, entry)| {
            entry.map(|entry| PostingRecord {
                entry_id: entry.id.into(),
                entry_number: entry.number,
                date: entry.entry_date,
                entry_description: entry.description,
                item: line.item,
                account_id: line.account_id.into(),
                debit: line.debit,
                credit: line.credit,
                note: line.note,
            })
        })
        .collect())
}

/// Loads the tenant's chart in code order.
pub(crate) async fn load_accounts<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
) -> Result<Vec<Account>, DbErr> {
    let rows = accounts::Entity::find()
        .filter(accounts::Column::TenantId.eq(tenant_id.into_inner()))
        .order_by_asc(accounts::Column::Code)
        .all(conn)
        .await?;

    Ok(rows.into_iter().map(Account::from).collect())
}

/// Loads the given accounts of a tenant keyed by id. Unknown ids are absent.
pub(crate) async fn accounts_by_id<C, I>(
    conn: &C,
    tenant_id: TenantId,
    ids: I,
) -> Result<HashMap<AccountId, Account>, DbErr>
where
    C: ConnectionTrait,
    I: IntoIterator<Item = AccountId>,
{
    let mut ids: Vec<uuid::Uuid> = ids.into_iter().map(AccountId::into_inner).collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = accounts::Entity::find()
        .filter(accounts::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(accounts::Column::Id.is_in(ids))
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let account = Account::from(row);
            (account.id, account)
        })
        .collect())
}

/// Finds the fiscal year covering `date`, if one is defined.
pub(crate) async fn find_covering_year<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    date: NaiveDate,
) -> Result<Option<FiscalYear>, DbErr> {
    let year = fiscal_years::Entity::find()
        .filter(fiscal_years::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(fiscal_years::Column::StartDate.lte(date))
        .filter(fiscal_years::Column::EndDate.gte(date))
        .one(conn)
        .await?;

    Ok(year.map(FiscalYear::from))
}
