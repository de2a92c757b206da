//! Fiscal year types.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use partida_shared::types::{FiscalYearId, TenantId};

/// Errors raised when defining fiscal years.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FiscalYearError {
    /// Start date is not before the end date.
    #[error("Fiscal year must start before it ends: {start} - {end}")]
    InvalidRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Date range overlaps an existing fiscal year.
    #[error("Fiscal year overlaps fiscal year {0}")]
    Overlap(i32),
}

/// Fiscal year definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYear {
    /// Unique identifier.
    pub id: FiscalYearId,
    /// Tenant this fiscal year belongs to.
    pub tenant_id: TenantId,
    /// Year number (e.g. 2024).
    pub year: i32,
    /// First day of the fiscal year.
    pub start_date: NaiveDate,
    /// Last day of the fiscal year.
    pub end_date: NaiveDate,
    /// Whether the year is closed for posting.
    pub closed: bool,
}

impl FiscalYear {
    /// Returns true if the given date falls within this fiscal year.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Returns true if both years share at least one day.
    #[must_use]
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start <= self.end_date && end >= self.start_date
    }

    /// Checks that a new year range is well formed and free of overlaps.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` when `start >= end` and `Overlap` when the
    /// range shares a day with one of `existing`.
    pub fn check_new_range(
        start: NaiveDate,
        end: NaiveDate,
        existing: &[Self],
    ) -> Result<(), FiscalYearError> {
        if start >= end {
            return Err(FiscalYearError::InvalidRange { start, end });
        }
        match existing.iter().find(|year| year.overlaps(start, end)) {
            Some(year) => Err(FiscalYearError::Overlap(year.year)),
            None => Ok(()),
        }
    }

    /// Calendar year of the start date, used when no explicit number is given.
    #[must_use]
    pub fn default_number(start: NaiveDate) -> i32 {
        start.year()
    }
}

/// Finds the fiscal year covering `date`.
#[must_use]
pub fn find_covering(years: &[FiscalYear], date: NaiveDate) -> Option<&FiscalYear> {
    years.iter().find(|year| year.contains_date(date))
}
