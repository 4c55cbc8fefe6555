//! Validity filtering and holdings-level deduplication.
//!
//! The regression is trained on one point per distinct bitcoin balance:
//! treasury updates are sparse, and a balance that stays flat for weeks would
//! otherwise dominate the fit with repeated points.

use std::collections::HashSet;

use crate::types::RecordTable;

/// The two derived views produced by [`clean`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanedData {
    /// Every row satisfying [`Observation::is_valid`](crate::Observation::is_valid),
    /// in table order.
    pub valid: RecordTable,
    /// First row for each distinct `btc_balance` among `valid`, in table order.
    pub unique: RecordTable,
    /// `valid.len() - unique.len()`.
    pub duplicates_removed: usize,
}

/// Split a record table into its valid and unique views.
///
/// Empty input and tables without a single valid row are not errors; they
/// simply produce empty views.
///
/// # Examples
///
/// ```
/// use treasury_core::{Date, Observation, RecordTable, clean};
///
/// let date = Date::from_ymd_opt(2025, 1, 1).unwrap();
/// let table = RecordTable::from(vec![
///     Observation::new(date, 10.0, 100.0, 1.0, 1.0),
///     Observation::new(date, 10.0, 110.0, 1.0, 1.0),
///     Observation::new(date, 0.0, 100.0, 1.0, 1.0),
/// ]);
///
/// let cleaned = clean(&table);
/// assert_eq!(cleaned.valid.len(), 2);
/// assert_eq!(cleaned.unique.len(), 1);
/// assert_eq!(cleaned.duplicates_removed, 1);
/// ```
#[must_use]
pub fn clean(records: &RecordTable) -> CleanedData {
    let valid: RecordTable = records.iter().filter(|r| r.is_valid()).copied().collect();

    // Valid balances are finite and positive, so bit patterns identify values
    let mut seen = HashSet::with_capacity(valid.len());
    let unique: RecordTable = valid
        .iter()
        .filter(|r| seen.insert(r.btc_balance.to_bits()))
        .copied()
        .collect();

    let duplicates_removed = valid.len() - unique.len();

    tracing::debug!(
        total = records.len(),
        valid = valid.len(),
        unique = unique.len(),
        duplicates_removed,
        "cleaned record table"
    );

    CleanedData {
        valid,
        unique,
        duplicates_removed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Date, Observation};

    fn row(day: u32, balance: f64, shares: f64) -> Observation {
        Observation::new(
            Date::from_ymd_opt(2025, 3, day).unwrap(),
            balance,
            shares,
            1.0,
            80_000.0,
        )
    }

    fn sample_table() -> RecordTable {
        RecordTable::from(vec![
            row(5, 100.0, 1000.0),
            row(1, 50.0, 900.0),
            row(2, 100.0, 1100.0),
            row(3, 0.0, 1000.0),
            row(4, f64::NAN, 1000.0),
            row(6, 150.0, 1200.0),
            row(7, 50.0, 1300.0),
        ])
    }

    #[test]
    fn test_clean_empty() {
        let cleaned = clean(&RecordTable::default());
        assert!(cleaned.valid.is_empty());
        assert!(cleaned.unique.is_empty());
        assert_eq!(cleaned.duplicates_removed, 0);
    }

    #[test]
    fn test_clean_all_invalid() {
        let table = RecordTable::from(vec![row(1, 0.0, 10.0), row(2, -5.0, 10.0)]);
        let cleaned = clean(&table);
        assert!(cleaned.valid.is_empty());
        assert!(cleaned.unique.is_empty());
        assert_eq!(cleaned.duplicates_removed, 0);
    }

    #[test]
    fn test_first_occurrence_in_table_order_wins() {
        let cleaned = clean(&sample_table());

        let balances: Vec<f64> = cleaned.unique.iter().map(|r| r.btc_balance).collect();
        assert_eq!(balances, vec![100.0, 50.0, 150.0]);

        // The kept 100 BTC row is the day-5 row, which comes first in the table
        // even though the day-2 row is chronologically earlier.
        assert_eq!(
            cleaned.unique.rows()[0].date,
            Date::from_ymd_opt(2025, 3, 5).unwrap()
        );
    }

    #[test]
    fn test_validity_filter_soundness() {
        let cleaned = clean(&sample_table());
        assert_eq!(cleaned.valid.len(), 5);
        for r in &cleaned.valid {
            assert!(r.btc_balance > 0.0);
            assert!(r.btc_per_diluted_share > 0.0);
        }
    }

    #[test]
    fn test_duplicate_count_conservation() {
        let cleaned = clean(&sample_table());
        assert_eq!(
            cleaned.valid.len(),
            cleaned.unique.len() + cleaned.duplicates_removed
        );
        assert_eq!(cleaned.duplicates_removed, 2);
    }

    #[test]
    fn test_dedup_idempotence() {
        let first = clean(&sample_table());
        let second = clean(&first.unique);

        assert_eq!(second.valid, first.unique);
        assert_eq!(second.unique, first.unique);
        assert_eq!(second.duplicates_removed, 0);
    }
}
