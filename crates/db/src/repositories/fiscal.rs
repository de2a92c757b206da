//! Fiscal year repository.

use chrono::NaiveDate;
use partida_core::fiscal::{FiscalYear, FiscalYearError};
use partida_shared::AppError;
use partida_shared::types::{FiscalYearId, TenantId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use super::support::{begin_serializable, find_covering_year};
use crate::entities::fiscal_years;

/// Error types for fiscal operations.
#[derive(Debug, thiserror::Error)]
pub enum FiscalError {
    /// Invalid or overlapping date range.
    #[error(transparent)]
    InvalidYear(#[from] FiscalYearError),

    /// Fiscal year not found.
    #[error("Fiscal year not found: {0}")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<FiscalError> for AppError {
    fn from(err: FiscalError) -> Self {
        match err {
            FiscalError::InvalidYear(e) => Self::Validation(e.to_string()),
            FiscalError::NotFound(id) => Self::NotFound(format!("fiscal year {id}")),
            FiscalError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for creating a fiscal year.
#[derive(Debug, Clone)]
pub struct CreateFiscalYearInput {
    /// Tenant ID.
    pub tenant_id: TenantId,
    /// Year number; defaults to the calendar year of `start_date`.
    pub year: Option<i32>,
    /// Start date of the fiscal year.
    pub start_date: NaiveDate,
    /// End date of the fiscal year.
    pub end_date: NaiveDate,
}

/// Fiscal year repository.
#[derive(Debug, Clone)]
pub struct FiscalRepository {
    db: DatabaseConnection,
}

impl FiscalRepository {
    /// Creates a new fiscal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a fiscal year after checking its range against the tenant's
    /// existing years.
    ///
    /// # Errors
    ///
    /// Returns `FiscalError::InvalidYear` when start is not before end or the
    /// range overlaps another year, or a database error.
    pub async fn create_fiscal_year(
        &self,
        input: CreateFiscalYearInput,
    ) -> Result<FiscalYear, FiscalError> {
        let txn = begin_serializable(&self.db).await?;

        let existing: Vec<FiscalYear> = fiscal_years::Entity::find()
            .filter(fiscal_years::Column::TenantId.eq(input.tenant_id.into_inner()))
            .lock_exclusive()
            .all(&txn)
            .await?
            .into_iter()
            .map(FiscalYear::from)
            .collect();
        FiscalYear::check_new_range(input.start_date, input.end_date, &existing)?;

        let year = fiscal_years::ActiveModel {
            id: Set(FiscalYearId::new().into_inner()),
            tenant_id: Set(input.tenant_id.into_inner()),
            year: Set(input
                .year
                .unwrap_or_else(|| FiscalYear::default_number(input.start_date))),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            closed: Set(false),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(tenant_id = %input.tenant_id, year = year.year, "fiscal year created");
        Ok(year.into())
    }

    /// Closes a fiscal year. Entries dated inside it can no longer be
    /// created, amended or voided.
    ///
    /// # Errors
    ///
    /// Returns `FiscalError::NotFound` or a database error.
    pub async fn close_year(
        &self,
        tenant_id: TenantId,
        id: FiscalYearId,
    ) -> Result<FiscalYear, FiscalError> {
        let txn = self.db.begin().await?;

        let year = fiscal_years::Entity::find_by_id(id.into_inner())
            .filter(fiscal_years::Column::TenantId.eq(tenant_id.into_inner()))
            .one(&txn)
            .await?
            .ok_or(FiscalError::NotFound(id.into_inner()))?;

        let mut active: fiscal_years::ActiveModel = year.into();
        active.closed = Set(true);
        let year = active.update(&txn).await?;

        txn.commit().await?;

        info!(tenant_id = %tenant_id, year = year.year, "fiscal year closed");
        Ok(year.into())
    }

    /// Finds the fiscal year covering `date`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_covering(
        &self,
        tenant_id: TenantId,
        date: NaiveDate,
    ) -> Result<Option<FiscalYear>, FiscalError> {
        Ok(find_covering_year(&self.db, tenant_id, date).await?)
    }

    /// Lists the tenant's fiscal years by start date.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_fiscal_years(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<FiscalYear>, FiscalError> {
        let years = fiscal_years::Entity::find()
            .filter(fiscal_years::Column::TenantId.eq(tenant_id.into_inner()))
            .order_by_asc(fiscal_years::Column::StartDate)
            .all(&self.db)
            .await?;

        Ok(years.into_iter().map(FiscalYear::from).collect())
    }
}
