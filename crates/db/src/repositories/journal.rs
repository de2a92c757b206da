//! Journal engine: numbered double-entry postings with amend and void.
//!
//! Every mutation runs in one serializable transaction that also maintains
//! the period balance store, and is retried on serialization conflicts.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use partida_core::ledger::{
    AmendEntryInput, CreateEntryInput, EntryStatus, EntryTotals, LineDraft, PostedEntry,
    PostedLine, ValidationError, ensure_year_open, next_number, validate_entry,
};
use partida_shared::types::{EntryId, PageRequest, PageResponse, TenantId, UserId};
use partida_shared::{AppError, LedgerConfig};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::balance::{apply_movement, reverse_movement};
use super::support::{
    accounts_by_id, begin_serializable, find_covering_year, is_retryable, with_retry,
};
use crate::entities::{
    journal_entries, journal_lines, sea_orm_active_enums::EntryStatus as StoredStatus,
};

/// Error types for journal operations.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    /// The entry breaks a posting rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Journal entry not found.
    #[error("Journal entry not found: {0}")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl JournalError {
    /// Returns true when another attempt may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(err) if is_retryable(err))
    }

    /// Returns the error code for structured output.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(err) => err.error_code(),
            Self::NotFound(_) => "ENTRY_NOT_FOUND",
            Self::Database(_) if self.is_retryable() => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<JournalError> for AppError {
    fn from(err: JournalError) -> Self {
        match err {
            JournalError::Validation(e) => Self::Validation(e.to_string()),
            JournalError::NotFound(id) => Self::NotFound(format!("journal entry {id}")),
            JournalError::Database(e) if is_retryable(&e) => Self::Conflict(e.to_string()),
            JournalError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// An entry with its totals checked against the balance tolerance.
#[derive(Debug, Clone, Serialize)]
pub struct EntryView {
    /// Header and ordered lines.
    pub entry: PostedEntry,
    /// Debit and credit totals.
    pub totals: EntryTotals,
    /// Whether the totals agree within the tolerance.
    pub is_balanced: bool,
}

/// Returns the number the next entry of `tenant_id` would get.
pub(crate) async fn next_number_in<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
) -> Result<i32, DbErr> {
    let current: Option<Option<i32>> = journal_entries::Entity::find()
        .select_only()
        .column_as(journal_entries::Column::Number.max(), "max_number")
        .filter(journal_entries::Column::TenantId.eq(tenant_id.into_inner()))
        .into_tuple()
        .one(conn)
        .await?;

    Ok(next_number(current.flatten()))
}

/// Validates and posts an entry on an open connection or transaction.
pub(crate) async fn create_in<C: ConnectionTrait>(
    conn: &C,
    ledger: &LedgerConfig,
    input: &CreateEntryInput,
) -> Result<PostedEntry, JournalError> {
    let tenant_id = input.tenant_id;
    let accounts = accounts_by_id(conn, tenant_id, input.lines.iter().map(|l| l.account_id)).await?;
    let fiscal_year = find_covering_year(conn, tenant_id, input.date).await?;
    validate_entry(
        tenant_id,
        input.date,
        &input.lines,
        &accounts,
        fiscal_year.as_ref(),
        ledger.balance_tolerance,
    )?;

    let number = next_number_in(conn, tenant_id).await?;
    let entry_id = EntryId::new();
    let now = Utc::now().into();

    let header = journal_entries::ActiveModel {
        id: Set(entry_id.into_inner()),
        tenant_id: Set(tenant_id.into_inner()),
        number: Set(number),
        entry_date: Set(input.date),
        description: Set(input.description.clone()),
        is_opening: Set(input.is_opening),
        status: Set(StoredStatus::Active),
        created_by: Set(input.created_by.map(UserId::into_inner)),
        created_at: Set(now),
        updated_at: Set(now),
        voided_at: Set(None),
        voided_by: Set(None),
    }
    .insert(conn)
    .await?;

    let lines = insert_lines(conn, entry_id, &input.lines).await?;
    let entry = to_posted(header, lines);
    for movement in entry.movements() {
        apply_movement(conn, tenant_id, &movement).await?;
    }

    Ok(entry)
}

async fn insert_lines<C: ConnectionTrait>(
    conn: &C,
    entry_id: EntryId,
    drafts: &[LineDraft],
) -> Result<Vec<journal_lines::Model>, DbErr> {
    let mut lines = Vec::with_capacity(drafts.len());
    for (item, draft) in (1..).zip(drafts) {
        let line = journal_lines::ActiveModel {
            id: Set(Uuid::now_v7()),
            entry_id: Set(entry_id.into_inner()),
            item: Set(item),
            account_id: Set(draft.account_id.into_inner()),
            debit: Set(draft.debit),
            credit: Set(draft.credit),
            note: Set(draft.note.clone()),
        }
        .insert(conn)
        .await?;
        lines.push(line);
    }
    Ok(lines)
}

async fn load_lines<C: ConnectionTrait>(
    conn: &C,
    entry_id: Uuid,
) -> Result<Vec<journal_lines::Model>, DbErr> {
    journal_lines::Entity::find()
        .filter(journal_lines::Column::EntryId.eq(entry_id))
        .order_by_asc(journal_lines::Column::Item)
        .all(conn)
        .await
}

async fn find_header<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    entry_id: EntryId,
) -> Result<journal_entries::Model, JournalError> {
    journal_entries::Entity::find_by_id(entry_id.into_inner())
        .filter(journal_entries::Column::TenantId.eq(tenant_id.into_inner()))
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or(JournalError::NotFound(entry_id.into_inner()))
}

/// Assembles a posted entry from its stored header and lines.
pub(crate) fn to_posted(header: journal_entries::Model, lines: Vec<journal_lines::Model>) -> PostedEntry {
    PostedEntry {
        id: header.id.into(),
        tenant_id: header.tenant_id.into(),
        number: header.number,
        date: header.entry_date,
        description: header.description,
        is_opening: header.is_opening,
        status: header.status.into(),
        lines: lines.into_iter().map(PostedLine::from).collect(),
    }
}

/// Journal repository.
#[derive(Debug, Clone)]
pub struct JournalRepository {
    db: DatabaseConnection,
    ledger: LedgerConfig,
}

impl JournalRepository {
    /// Creates a new journal repository with default ledger settings.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_config(db, LedgerConfig::default())
    }

    /// Creates a new journal repository.
    #[must_use]
    pub const fn with_config(db: DatabaseConnection, ledger: LedgerConfig) -> Self {
        Self { db, ledger }
    }

    /// Returns the number the next entry of the tenant would receive.
    ///
    /// Informational only: `create` assigns the number inside its own
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn next_number(&self, tenant_id: TenantId) -> Result<i32, JournalError> {
        Ok(next_number_in(&self.db, tenant_id).await?)
    }

    /// Validates and posts a new entry, updating period balances.
    ///
    /// # Errors
    ///
    /// Returns `JournalError::Validation` when a posting rule is broken
    /// (nothing is written), or a database error that survived every retry.
    pub async fn create(&self, input: CreateEntryInput) -> Result<PostedEntry, JournalError> {
        let entry = with_retry(
            self.ledger.retry_attempts,
            "create_entry",
            JournalError::is_retryable,
            || self.try_create(&input),
        )
        .await?;

        info!(
            tenant_id = %entry.tenant_id,
            entry_id = %entry.id,
            number = entry.number,
            lines = entry.lines.len(),
            "journal entry created"
        );
        Ok(entry)
    }

    async fn try_create(&self, input: &CreateEntryInput) -> Result<PostedEntry, JournalError> {
        let txn = begin_serializable(&self.db).await?;
        let entry = create_in(&txn, &self.ledger, input).await?;
        txn.commit().await?;
        Ok(entry)
    }

    /// Replaces the date, description and lines of an active entry.
    ///
    /// The old lines are reversed at the old date and the new ones applied
    /// at the new date. The entry keeps its id and number.
    ///
    /// # Errors
    ///
    /// Returns `JournalError::NotFound` for an unknown entry,
    /// `JournalError::Validation` for a void entry, a closed fiscal year on
    /// either date or invalid lines, or a database error.
    pub async fn amend(
        &self,
        tenant_id: TenantId,
        entry_id: EntryId,
        input: AmendEntryInput,
    ) -> Result<PostedEntry, JournalError> {
        let entry = with_retry(
            self.ledger.retry_attempts,
            "amend_entry",
            JournalError::is_retryable,
            || self.try_amend(tenant_id, entry_id, &input),
        )
        .await?;

        info!(
            tenant_id = %tenant_id,
            entry_id = %entry_id,
            number = entry.number,
            amended_by = ?input.amended_by,
            "journal entry amended"
        );
        Ok(entry)
    }

    async fn try_amend(
        &self,
        tenant_id: TenantId,
        entry_id: EntryId,
        input: &AmendEntryInput,
    ) -> Result<PostedEntry, JournalError> {
        let txn = begin_serializable(&self.db).await?;

        let header = find_header(&txn, tenant_id, entry_id).await?;
        if !EntryStatus::from(header.status).can_amend() {
            return Err(ValidationError::CannotAmendVoid.into());
        }

        let old_year = find_covering_year(&txn, tenant_id, header.entry_date).await?;
        ensure_year_open(old_year.as_ref(), header.entry_date)?;

        let accounts =
            accounts_by_id(&txn, tenant_id, input.lines.iter().map(|l| l.account_id)).await?;
        let new_year = find_covering_year(&txn, tenant_id, input.date).await?;
        validate_entry(
            tenant_id,
            input.date,
            &input.lines,
            &accounts,
            new_year.as_ref(),
            self.ledger.balance_tolerance,
        )?;

        let old_lines = load_lines(&txn, header.id).await?;
        let old_entry = to_posted(header.clone(), old_lines);
        for movement in old_entry.movements() {
            reverse_movement(&txn, tenant_id, &movement).await?;
        }

        journal_lines::Entity::delete_many()
            .filter(journal_lines::Column::EntryId.eq(header.id))
            .exec(&txn)
            .await?;
        let lines = insert_lines(&txn, entry_id, &input.lines).await?;

        let mut active: journal_entries::ActiveModel = header.into();
        active.entry_date = Set(input.date);
        active.description = Set(input.description.clone());
        active.updated_at = Set(Utc::now().into());
        let header = active.update(&txn).await?;

        let entry = to_posted(header, lines);
        for movement in entry.movements() {
            apply_movement(&txn, tenant_id, &movement).await?;
        }

        txn.commit().await?;
        Ok(entry)
    }

    /// Marks an active entry void and reverses its lines. The entry keeps
    /// its number.
    ///
    /// # Errors
    ///
    /// Returns `JournalError::NotFound` for an unknown entry,
    /// `JournalError::Validation` when it is already void or its fiscal year
    /// is closed, or a database error.
    pub async fn void(
        &self,
        tenant_id: TenantId,
        entry_id: EntryId,
        voided_by: Option<UserId>,
    ) -> Result<PostedEntry, JournalError> {
        let entry = with_retry(
            self.ledger.retry_attempts,
            "void_entry",
            JournalError::is_retryable,
            || self.try_void(tenant_id, entry_id, voided_by),
        )
        .await?;

        info!(
            tenant_id = %tenant_id,
            entry_id = %entry_id,
            number = entry.number,
            "journal entry voided"
        );
        Ok(entry)
    }

    async fn try_void(
        &self,
        tenant_id: TenantId,
        entry_id: EntryId,
        voided_by: Option<UserId>,
    ) -> Result<PostedEntry, JournalError> {
        let txn = begin_serializable(&self.db).await?;

        let header = find_header(&txn, tenant_id, entry_id).await?;
        if !EntryStatus::from(header.status).can_void() {
            return Err(ValidationError::AlreadyVoid.into());
        }

        let fiscal_year = find_covering_year(&txn, tenant_id, header.entry_date).await?;
        ensure_year_open(fiscal_year.as_ref(), header.entry_date)?;

        let lines = load_lines(&txn, header.id).await?;
        for movement in to_posted(header.clone(), lines.clone()).movements() {
            reverse_movement(&txn, tenant_id, &movement).await?;
        }

        let now = Utc::now().into();
        let mut active: journal_entries::ActiveModel = header.into();
        active.status = Set(StoredStatus::Void);
        active.voided_at = Set(Some(now));
        active.voided_by = Set(voided_by.map(UserId::into_inner));
        active.updated_at = Set(now);
        let header = active.update(&txn).await?;

        txn.commit().await?;
        Ok(to_posted(header, lines))
    }

    /// First page of an entry listing, sized by `ledger.page_size`.
    #[must_use]
    pub fn first_page(&self) -> PageRequest {
        PageRequest::first(self.ledger.page_size)
    }

    /// Fetches one entry with its lines and totals.
    ///
    /// # Errors
    ///
    /// Returns `JournalError::NotFound` for an unknown entry, or a database error.
    pub async fn get_entry(
        &self,
        tenant_id: TenantId,
        entry_id: EntryId,
    ) -> Result<EntryView, JournalError> {
        let header = journal_entries::Entity::find_by_id(entry_id.into_inner())
            .filter(journal_entries::Column::TenantId.eq(tenant_id.into_inner()))
            .one(&self.db)
            .await?
            .ok_or(JournalError::NotFound(entry_id.into_inner()))?;
        let lines = load_lines(&self.db, header.id).await?;
        let entry = to_posted(header, lines);
        let totals = entry.totals();

        Ok(EntryView {
            is_balanced: totals.is_balanced(self.ledger.balance_tolerance),
            totals,
            entry,
        })
    }

    /// Entries dated inside `[from, to]` ordered by date then number.
    ///
    /// Void entries are skipped unless `include_void` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn entries_in_range(
        &self,
        tenant_id: TenantId,
        from: NaiveDate,
        to: NaiveDate,
        include_void: bool,
        page: &PageRequest,
    ) -> Result<PageResponse<PostedEntry>, JournalError> {
        let mut query = journal_entries::Entity::find()
            .filter(journal_entries::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(journal_entries::Column::EntryDate.gte(from))
            .filter(journal_entries::Column::EntryDate.lte(to));
        if !include_void {
            query = query.filter(journal_entries::Column::Status.eq(StoredStatus::Active));
        }

        let total = query.clone().count(&self.db).await?;
        let headers = query
            .order_by_asc(journal_entries::Column::EntryDate)
            .order_by_asc(journal_entries::Column::Number)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        let ids: Vec<Uuid> = headers.iter().map(|h| h.id).collect();
        let mut lines_by_entry: HashMap<Uuid, Vec<journal_lines::Model>> = HashMap::new();
        if !ids.is_empty() {
            let lines = journal_lines::Entity::find()
                .filter(journal_lines::Column::EntryId.is_in(ids))
                .order_by_asc(journal_lines::Column::Item)
                .all(&self.db)
                .await?;
            for line in lines {
                lines_by_entry.entry(line.entry_id).or_default().push(line);
            }
        }

        let entries = headers
            .into_iter()
            .map(|header| {
                let lines = lines_by_entry.remove(&header.id).unwrap_or_default();
                to_posted(header, lines)
            })
            .collect();

        Ok(PageResponse::new(entries, page, total))
    }
}
