//! Fiscal year posting rules.

use chrono::NaiveDate;

use super::error::ValidationError;
use crate::fiscal::FiscalYear;

/// Rejects `date` when it falls inside a closed fiscal year.
///
/// A date not covered by any fiscal year is accepted. Applies to create,
/// amend (both the old and the new date) and void.
///
/// # Errors
///
/// Returns `ValidationError::FiscalYearClosed` when posting is locked.
pub fn ensure_year_open(
    fiscal_year: Option<&FiscalYear>,
    date: NaiveDate,
) -> Result<(), ValidationError> {
    match fiscal_year {
        Some(year) if year.closed && year.contains_date(date) => {
            Err(ValidationError::FiscalYearClosed { year: year.year })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use partida_shared::types::{FiscalYearId, TenantId};

    fn year(closed: bool) -> FiscalYear {
        FiscalYear {
            id: FiscalYearId::new(),
            tenant_id: TenantId::new(),
            year: 2024,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            closed,
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A closed year rejects every date it covers; an open one accepts them.
        #[test]
        fn prop_closed_year_locks_its_dates(ordinal in 1u32..=366) {
            let date = NaiveDate::from_yo_opt(2024, ordinal).unwrap();
            prop_assert_eq!(
                ensure_year_open(Some(&year(true)), date),
                Err(ValidationError::FiscalYearClosed { year: 2024 })
            );
            prop_assert!(ensure_year_open(Some(&year(false)), date).is_ok());
        }
    }

    #[test]
    fn test_no_year_is_open() {
        let date = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        assert!(ensure_year_open(None, date).is_ok());
    }

    #[test]
    fn test_closed_year_outside_range() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert!(ensure_year_open(Some(&year(true)), date).is_ok());
    }
}
