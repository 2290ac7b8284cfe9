use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use tracing::debug;

use super::types::{add_months, month_start, months_between, ProductSeries, SalesRecord, SalesTable};

/// Number of products pre-selected when the caller does not choose any.
pub const DEFAULT_SELECTION_SIZE: usize = 3;

/// The monthly history of one product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductHistory {
    pub product_code: i64,
    /// First non-blank description seen for the product, else "Product {code}".
    /// Depends on input row order when a product has several descriptions.
    pub product_description: String,
    pub series: ProductSeries,
}

/// Extract one product's rows and resample them to a gap-free monthly series.
///
/// Quantities in the same month are summed; months inside the observed span
/// with no rows are filled with zero. Rows without a valid month are ignored.
/// Returns `None` when no row carries the product code.
pub fn aggregate_product(table: &SalesTable, product_code: i64) -> Option<ProductHistory> {
    let rows: Vec<&SalesRecord> = table
        .iter()
        .filter(|r| r.product_code == product_code)
        .collect();
    if rows.is_empty() {
        return None;
    }

    let product_description = rows
        .iter()
        .map(|r| r.product_description.as_str())
        .find(|d| !d.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Product {product_code}"));

    let mut monthly: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for row in &rows {
        if let Some(month) = row.month {
            *monthly.entry(month_start(month)).or_insert(0.0) += row.quantity;
        }
    }

    let series = resample_monthly(&monthly);
    debug!(
        product_code,
        rows = rows.len(),
        months = series.len(),
        "aggregated product history"
    );

    Some(ProductHistory {
        product_code,
        product_description,
        series,
    })
}

/// Spread per-month sums over every month from the first to the last key.
fn resample_monthly(monthly: &BTreeMap<NaiveDate, f64>) -> ProductSeries {
    let (Some((&first, _)), Some((&last, _))) =
        (monthly.first_key_value(), monthly.last_key_value())
    else {
        return ProductSeries::default();
    };

    let span = months_between(first, last).max(0) as u32 + 1;
    let months: Vec<NaiveDate> = (0..span).filter_map(|i| add_months(first, i)).collect();
    let quantities = months
        .iter()
        .map(|m| monthly.get(m).copied().unwrap_or(0.0))
        .collect();

    ProductSeries { months, quantities }
}

/// Unique product codes in order of first appearance.
pub fn product_codes(table: &SalesTable) -> Vec<i64> {
    let mut seen = HashSet::new();
    table
        .iter()
        .map(|r| r.product_code)
        .filter(|code| seen.insert(*code))
        .collect()
}

/// The first [`DEFAULT_SELECTION_SIZE`] product codes, or all of them if fewer.
pub fn default_selection(table: &SalesTable) -> Vec<i64> {
    let mut codes = product_codes(table);
    codes.truncate(DEFAULT_SELECTION_SIZE);
    codes
}

/// The first `n` records, for previews.
pub fn sample(table: &SalesTable, n: usize) -> &[SalesRecord] {
    &table.records()[..n.min(table.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::first_of_month;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn record(code: i64, desc: &str, month: Option<(i32, u32)>, quantity: f64) -> SalesRecord {
        SalesRecord {
            product_code: code,
            product_description: desc.to_string(),
            month: month.and_then(|(y, m)| first_of_month(y, m)),
            quantity,
        }
    }

    fn ym(year: i32, month: u32) -> NaiveDate {
        first_of_month(year, month).unwrap()
    }

    #[test]
    fn test_sums_within_month_and_fills_gaps() {
        let table = SalesTable::new(vec![
            record(7, "gadget", Some((2023, 3)), 2.0),
            record(7, "gadget", Some((2023, 1)), 5.0),
            record(7, "gadget", Some((2023, 1)), 1.5),
            record(8, "other", Some((2023, 2)), 100.0),
        ]);
        let history = aggregate_product(&table, 7).unwrap();

        assert_eq!(history.series.months, vec![ym(2023, 1), ym(2023, 2), ym(2023, 3)]);
        assert_eq!(history.series.quantities, vec![6.5, 0.0, 2.0]);
        assert_eq!(history.product_description, "gadget");
    }

    #[test]
    fn test_series_crosses_year_boundary() {
        let table = SalesTable::new(vec![
            record(1, "a", Some((2022, 11)), 1.0),
            record(1, "a", Some((2023, 2)), 1.0),
        ]);
        let series = aggregate_product(&table, 1).unwrap().series;
        assert_eq!(series.len(), 4);
        assert_eq!(series.months[1], ym(2022, 12));
        assert_eq!(series.months[2], ym(2023, 1));
    }

    #[test]
    fn test_unknown_product_is_no_data() {
        let table = SalesTable::new(vec![record(1, "a", Some((2023, 1)), 1.0)]);
        assert!(aggregate_product(&table, 99).is_none());
    }

    #[test]
    fn test_description_first_non_blank_wins() {
        let table = SalesTable::new(vec![
            record(3, "  ", Some((2023, 1)), 1.0),
            record(3, "second", Some((2023, 2)), 1.0),
            record(3, "third", Some((2023, 3)), 1.0),
        ]);
        assert_eq!(aggregate_product(&table, 3).unwrap().product_description, "second");
    }

    #[test]
    fn test_description_fallback_label() {
        let table = SalesTable::new(vec![record(42, "", Some((2023, 1)), 1.0)]);
        assert_eq!(aggregate_product(&table, 42).unwrap().product_description, "Product 42");
    }

    #[test]
    fn test_invalid_months_excluded() {
        let table = SalesTable::new(vec![record(5, "a", None, 9.0)]);
        let history = aggregate_product(&table, 5).unwrap();
        assert!(history.series.is_empty());
    }

    #[test]
    fn test_product_codes_first_appearance() {
        let table = SalesTable::new(vec![
            record(3, "", None, 0.0),
            record(1, "", None, 0.0),
            record(3, "", None, 0.0),
            record(2, "", None, 0.0),
            record(4, "", None, 0.0),
        ]);
        assert_eq!(product_codes(&table), vec![3, 1, 2, 4]);
        assert_eq!(default_selection(&table), vec![3, 1, 2]);
        assert_eq!(sample(&table, 2).len(), 2);
        assert_eq!(sample(&table, 50).len(), 5);
    }

    proptest! {
        #[test]
        fn prop_series_gap_free_and_conserves_mass(
            rows in proptest::collection::vec((2018i32..2024, 1u32..=12, 0.0f64..500.0), 1..60)
        ) {
            let table: SalesTable = rows
                .iter()
                .map(|&(y, m, q)| record(1, "p", Some((y, m)), q))
                .collect();
            let series = aggregate_product(&table, 1).unwrap().series;

            for pair in series.months.windows(2) {
                prop_assert_eq!(months_between(pair[0], pair[1]), 1);
            }
            let input: f64 = rows.iter().map(|r| r.2).sum();
            prop_assert!((series.total() - input).abs() < 1e-6 * input.max(1.0));
        }
    }
}
