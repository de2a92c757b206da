//! Period balance store.
//!
//! One row per (account, year, month) holds the debit and credit totals and
//! their net. Every journal mutation applies or reverses its lines here in
//! the same transaction; `recompute` rebuilds the rows from the journal.

use std::collections::BTreeMap;

use chrono::Utc;
use partida_core::ledger::{BalanceBook, CachedBalance, Movement, PeriodKey, PeriodTotals};
use partida_shared::{AppError, LedgerConfig};
use partida_shared::types::{AccountId, TenantId};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QuerySelect, Set,
};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::support::{
    PostingScope, begin_serializable, is_retryable, load_postings, month_column, month_value,
    with_retry,
};
use crate::entities::{accounts, period_balances};

/// Error types for balance operations.
#[derive(Debug, thiserror::Error)]
pub enum BalanceError {
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl BalanceError {
    /// Returns true when another attempt may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(err) if is_retryable(err))
    }
}

impl From<BalanceError> for AppError {
    fn from(err: BalanceError) -> Self {
        match err {
            BalanceError::AccountNotFound(id) => Self::NotFound(format!("account {id}")),
            BalanceError::Database(e) if is_retryable(&e) => Self::Conflict(e.to_string()),
            BalanceError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// What a recompute rewrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecomputeSummary {
    /// Period rows deleted before the replay.
    pub periods_removed: u64,
    /// Period rows written by the replay.
    pub periods_written: usize,
    /// Accounts whose cached balance was reset.
    pub accounts_reset: u64,
    /// Active lines replayed.
    pub lines_replayed: usize,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Apply,
    Reverse,
}

/// Adds a movement to its period row and to the account's cached balance,
/// creating the period row on first use.
pub(crate) async fn apply_movement<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    movement: &Movement,
) -> Result<(), DbErr> {
    adjust(conn, tenant_id, movement, Direction::Apply).await
}

/// Subtracts a movement from its period row and cached balance. The cached
/// last-movement date is left alone.
pub(crate) async fn reverse_movement<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    movement: &Movement,
) -> Result<(), DbErr> {
    adjust(conn, tenant_id, movement, Direction::Reverse).await
}

async fn adjust<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    movement: &Movement,
    direction: Direction,
) -> Result<(), DbErr> {
    let key = movement.period();
    let row = period_balances::Entity::find()
        .filter(period_balances::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(period_balances::Column::AccountId.eq(key.account_id.into_inner()))
        .filter(period_balances::Column::Year.eq(key.year))
        .filter(period_balances::Column::Month.eq(month_column(key.month)))
        .lock_exclusive()
        .one(conn)
        .await?;

    let mut totals = row.as_ref().map(PeriodTotals::from).unwrap_or_default();
    match direction {
        Direction::Apply => totals.apply(movement.debit, movement.credit),
        Direction::Reverse => totals.reverse(movement.debit, movement.credit),
    }

    if let Some(row) = row {
        let mut active: period_balances::ActiveModel = row.into();
        active.debit_total = Set(totals.debit_total);
        active.credit_total = Set(totals.credit_total);
        active.net = Set(totals.net);
        active.update(conn).await?;
    } else {
        debug!(
            account_id = %key.account_id,
            year = key.year,
            month = key.month,
            "creating period balance row"
        );
        period_row(tenant_id, &key, &totals).insert(conn).await?;
    }

    let account = accounts::Entity::find_by_id(movement.account_id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("account {}", movement.account_id)))?;

    let mut cached = CachedBalance {
        balance: account.last_balance,
        last_movement: account.last_movement,
    };
    match direction {
        Direction::Apply => cached.apply(movement.date, movement.debit, movement.credit),
        Direction::Reverse => cached.reverse(movement.debit, movement.credit),
    }

    let mut active: accounts::ActiveModel = account.into();
    active.last_balance = Set(cached.balance);
    active.last_movement = Set(cached.last_movement);
    active.updated_at = Set(Utc::now().into());
    active.update(conn).await?;

    Ok(())
}

fn period_row(
    tenant_id: TenantId,
    key: &PeriodKey,
    totals: &PeriodTotals,
) -> period_balances::ActiveModel {
    period_balances::ActiveModel {
        id: Set(Uuid::now_v7()),
        tenant_id: Set(tenant_id.into_inner()),
        account_id: Set(key.account_id.into_inner()),
        year: Set(key.year),
        month: Set(month_column(key.month)),
        debit_total: Set(totals.debit_total),
        credit_total: Set(totals.credit_total),
        net: Set(totals.net),
    }
}

/// Period balance repository.
#[derive(Debug, Clone)]
pub struct BalanceRepository {
    db: DatabaseConnection,
    ledger: LedgerConfig,
}

impl BalanceRepository {
    /// Creates a new balance repository with default ledger settings.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_config(db, LedgerConfig::default())
    }

    /// Creates a new balance repository.
    #[must_use]
    pub const fn with_config(db: DatabaseConnection, ledger: LedgerConfig) -> Self {
        Self { db, ledger }
    }

    /// Rebuilds period rows and cached balances from the active journal.
    ///
    /// With `account_id` only that account is rebuilt. Rows and caches are
    /// cleared first, then every active line is replayed in (date, entry
    /// number) order.
    ///
    /// # Errors
    ///
    /// Returns an error if the account is unknown or a database operation fails.
    pub async fn recompute(
        &self,
        tenant_id: TenantId,
        account_id: Option<AccountId>,
    ) -> Result<RecomputeSummary, BalanceError> {
        let summary = with_retry(
            self.ledger.retry_attempts,
            "recompute_balances",
            BalanceError::is_retryable,
            || self.try_recompute(tenant_id, account_id),
        )
        .await?;

        info!(
            tenant_id = %tenant_id,
            account_id = ?account_id,
            periods_written = summary.periods_written,
            lines_replayed = summary.lines_replayed,
            "balances recomputed"
        );
        Ok(summary)
    }

    async fn try_recompute(
        &self,
        tenant_id: TenantId,
        account_id: Option<AccountId>,
    ) -> Result<RecomputeSummary, BalanceError> {
        let txn = begin_serializable(&self.db).await?;

        if let Some(id) = account_id {
            let exists = accounts::Entity::find_by_id(id.into_inner())
                .filter(accounts::Column::TenantId.eq(tenant_id.into_inner()))
                .one(&txn)
                .await?
                .is_some();
            if !exists {
                return Err(BalanceError::AccountNotFound(id.into_inner()));
            }
        }

        let mut rows = Condition::all()
            .add(period_balances::Column::TenantId.eq(tenant_id.into_inner()));
        let mut cached = Condition::all().add(accounts::Column::TenantId.eq(tenant_id.into_inner()));
        if let Some(id) = account_id {
            rows = rows.add(period_balances::Column::AccountId.eq(id.into_inner()));
            cached = cached.add(accounts::Column::Id.eq(id.into_inner()));
        }

        let periods_removed = period_balances::Entity::delete_many()
            .filter(rows)
            .exec(&txn)
            .await?
            .rows_affected;
        let accounts_reset = accounts::Entity::update_many()
            .col_expr(accounts::Column::LastBalance, Expr::value(Decimal::ZERO))
            .col_expr(
                accounts::Column::LastMovement,
                Expr::value(Option::<chrono::NaiveDate>::None),
            )
            .filter(cached)
            .exec(&txn)
            .await?
            .rows_affected;

        let scope = PostingScope {
            account_id,
            ..PostingScope::default()
        };
        let postings = load_postings(&txn, tenant_id, scope).await?;
        let movements: Vec<Movement> = postings.iter().map(|p| p.movement()).collect();
        let book = BalanceBook::replay(&movements);

        let mut periods_written = 0;
        for (key, totals) in book.periods() {
            period_row(tenant_id, key, totals).insert(&txn).await?;
            periods_written += 1;
        }
        for (id, balance) in book.accounts() {
            accounts::Entity::update_many()
                .col_expr(accounts::Column::LastBalance, Expr::value(balance.balance))
                .col_expr(accounts::Column::LastMovement, Expr::value(balance.last_movement))
                .filter(accounts::Column::Id.eq(id.into_inner()))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;

        Ok(RecomputeSummary {
            periods_removed,
            periods_written,
            accounts_reset,
            lines_replayed: movements.len(),
        })
    }

    /// Totals of one account in one month; zero when no row exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn period_balance(
        &self,
        tenant_id: TenantId,
        account_id: AccountId,
        year: i32,
        month: u32,
    ) -> Result<PeriodTotals, BalanceError> {
        let row = period_balances::Entity::find()
            .filter(period_balances::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(period_balances::Column::AccountId.eq(account_id.into_inner()))
            .filter(period_balances::Column::Year.eq(year))
            .filter(period_balances::Column::Month.eq(month_column(month)))
            .one(&self.db)
            .await?;

        Ok(row.as_ref().map(PeriodTotals::from).unwrap_or_default())
    }

    /// Sum of the account's nets over every period up to and including
    /// `(year, month)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn accumulated_balance(
        &self,
        tenant_id: TenantId,
        account_id: AccountId,
        year: i32,
        month: u32,
    ) -> Result<Decimal, BalanceError> {
        let rows = period_balances::Entity::find()
            .filter(period_balances::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(period_balances::Column::AccountId.eq(account_id.into_inner()))
            .filter(
                Condition::any()
                    .add(period_balances::Column::Year.lt(year))
                    .add(
                        Condition::all()
                            .add(period_balances::Column::Year.eq(year))
                            .add(period_balances::Column::Month.lte(month_column(month))),
                    ),
            )
            .all(&self.db)
            .await?;

        Ok(rows.iter().map(|row| row.net).sum())
    }

    /// Every stored period row of the tenant, optionally for one account.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn periods(
        &self,
        tenant_id: TenantId,
        account_id: Option<AccountId>,
    ) -> Result<BTreeMap<PeriodKey, PeriodTotals>, BalanceError> {
        let mut query = period_balances::Entity::find()
            .filter(period_balances::Column::TenantId.eq(tenant_id.into_inner()));
        if let Some(id) = account_id {
            query = query.filter(period_balances::Column::AccountId.eq(id.into_inner()));
        }

        Ok(query
            .all(&self.db)
            .await?
            .into_iter()
            .map(|row| {
                let key = PeriodKey {
                    account_id: row.account_id.into(),
                    year: row.year,
                    month: month_value(row.month),
                };
                (key, PeriodTotals::from(&row))
            })
            .collect())
    }

    /// The account's cached running balance and last movement date.
    ///
    /// # Errors
    ///
    /// Returns an error if the account is unknown or the query fails.
    pub async fn cached_balance(
        &self,
        tenant_id: TenantId,
        account_id: AccountId,
    ) -> Result<CachedBalance, BalanceError> {
        let account = accounts::Entity::find_by_id(account_id.into_inner())
            .filter(accounts::Column::TenantId.eq(tenant_id.into_inner()))
            .one(&self.db)
            .await?
            .ok_or(BalanceError::AccountNotFound(account_id.into_inner()))?;

        Ok(CachedBalance {
            balance: account.last_balance,
            last_movement: account.last_movement,
        })
    }
}
