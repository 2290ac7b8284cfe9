use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::forecast::models::ModelSummary;

/// Minimum number of monthly observations required to fit any trend model.
pub const MIN_DATA_POINTS: usize = 2;

/// One normalized sales line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    /// Product code with hyphens removed, e.g. "100-1" becomes 1001.
    pub product_code: i64,
    /// Lowercase description with punctuation replaced by spaces.
    pub product_description: String,
    /// First day of the sales month. `None` when the month text did not parse.
    pub month: Option<NaiveDate>,
    /// Quantity sold, never negative.
    pub quantity: f64,
}

/// An ordered collection of normalized sales records.
///
/// Records are neither sorted by month nor grouped by product, and a product
/// may have several records in the same month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesTable {
    records: Vec<SalesRecord>,
}

impl SalesTable {
    pub fn new(records: Vec<SalesRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SalesRecord> {
        self.records.iter()
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the table has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<SalesRecord> for SalesTable {
    fn from_iter<I: IntoIterator<Item = SalesRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SalesTable {
    type Item = &'a SalesRecord;
    type IntoIter = std::slice::Iter<'a, SalesRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// A gap-free monthly series of summed quantities for one product.
///
/// `months[i + 1]` is always exactly one calendar month after `months[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductSeries {
    pub months: Vec<NaiveDate>,
    pub quantities: Vec<f64>,
}

impl ProductSeries {
    /// Returns the number of monthly observations.
    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    /// Returns true if the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    /// Returns the last month, or None if empty.
    pub fn last_month(&self) -> Option<NaiveDate> {
        self.months.last().copied()
    }

    /// Iterates `(month, quantity)` pairs in month order.
    pub fn points(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.months.iter().copied().zip(self.quantities.iter().copied())
    }

    /// Sum of all quantities in the series.
    pub fn total(&self) -> f64 {
        self.quantities.iter().sum()
    }
}

/// The forecast for one product along with the history it was fitted on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    pub product_code: i64,
    pub product_description: String,
    pub history: ProductSeries,
    /// Point forecasts for the months immediately following the history.
    /// Not clamped: a falling trend can extrapolate below zero.
    pub forecast: Vec<f64>,
    pub model: ModelSummary,
}

/// Returns the first day of the given month, or None for an invalid month.
pub fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Truncates a date to the first day of its month.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Advances a month by `n` calendar months.
pub fn add_months(month: NaiveDate, n: u32) -> Option<NaiveDate> {
    month.checked_add_months(Months::new(n))
}

/// Number of whole calendar months from `start` to `end` (negative if `end` is earlier).
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (i64::from(end.year()) - i64::from(start.year())) * 12 + i64::from(end.month())
        - i64::from(start.month())
}

/// Three-letter English abbreviation of a month, e.g. "Jan".
pub fn month_abbreviation(month: NaiveDate) -> String {
    month.format("%b").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(year: i32, month: u32) -> NaiveDate {
        first_of_month(year, month).unwrap()
    }

    #[test]
    fn test_add_months_crosses_year() {
        assert_eq!(add_months(ym(2023, 11), 1), Some(ym(2023, 12)));
        assert_eq!(add_months(ym(2023, 12), 1), Some(ym(2024, 1)));
        assert_eq!(add_months(ym(2023, 1), 25), Some(ym(2025, 2)));
    }

    #[test]
    fn test_months_between() {
        assert_eq!(months_between(ym(2023, 1), ym(2023, 1)), 0);
        assert_eq!(months_between(ym(2023, 11), ym(2024, 2)), 3);
        assert_eq!(months_between(ym(2024, 2), ym(2023, 11)), -3);
    }

    #[test]
    fn test_month_start() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(month_start(d), ym(2024, 2));
    }

    #[test]
    fn test_month_abbreviation() {
        assert_eq!(month_abbreviation(ym(1900, 12)), "Dec");
        assert_eq!(month_abbreviation(ym(2020, 5)), "May");
    }

    #[test]
    fn test_series_accessors() {
        let series = ProductSeries {
            months: vec![ym(2023, 1), ym(2023, 2)],
            quantities: vec![3.0, 4.5],
        };
        assert_eq!(series.len(), 2);
        assert_eq!(series.last_month(), Some(ym(2023, 2)));
        assert_eq!(series.total(), 7.5);
        assert_eq!(series.points().count(), 2);
        assert!(ProductSeries::default().is_empty());
    }
}
