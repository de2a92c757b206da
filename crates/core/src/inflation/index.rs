//! Price index tables.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One year of a monthly price-index table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexTable {
    /// Table code (e.g. "A").
    pub code: String,
    /// Calendar year.
    pub year: i32,
    /// Optional title.
    pub title: Option<String>,
    /// Index values for January through December.
    pub values: [Option<Decimal>; 12],
}

impl IndexTable {
    /// Returns the index of a month (1-12).
    ///
    /// Missing, zero and out-of-range months are "not available".
    #[must_use]
    pub fn index(&self, month: u32) -> Option<Decimal> {
        let slot = usize::try_from(month).ok()?.checked_sub(1)?;
        self.values
            .get(slot)
            .copied()
            .flatten()
            .filter(|value| !value.is_zero())
    }
}

/// The years of one index table, keyed by year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSeries {
    years: BTreeMap<i32, IndexTable>,
}

impl IndexSeries {
    /// Builds a series from yearly tables. A later table for the same year wins.
    #[must_use]
    pub fn new(tables: impl IntoIterator<Item = IndexTable>) -> Self {
        Self {
            years: tables.into_iter().map(|t| (t.year, t)).collect(),
        }
    }

    /// Returns the index for a year and month.
    #[must_use]
    pub fn index_at(&self, year: i32, month: u32) -> Option<Decimal> {
        self.years.get(&year)?.index(month)
    }

    /// Returns `index(dest) / index(origin)`.
    #[must_use]
    pub fn factor(&self, origin: (i32, u32), dest: (i32, u32)) -> Option<Decimal> {
        factor(
            self.index_at(origin.0, origin.1),
            self.index_at(dest.0, dest.1),
        )
    }
}

/// Restatement factor between two index values.
///
/// Defined only when both values exist and the origin is positive.
#[must_use]
pub fn factor(origin: Option<Decimal>, dest: Option<Decimal>) -> Option<Decimal> {
    let origin = origin.filter(|value| *value > Decimal::ZERO)?;
    dest?.checked_div(origin)
}
