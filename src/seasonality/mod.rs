//! Season filtering of a normalized sales table.

pub mod season;

use std::borrow::Cow;

use chrono::Datelike;
use tracing::debug;

use crate::common::types::SalesTable;
pub use season::Season;

/// Restrict a table to the records whose month falls in `season`.
///
/// `Season::All` borrows the input unchanged. For any other season, records
/// with an unparsable month are dropped since they have no month to match.
/// An empty result is a valid, empty table.
pub fn filter_by_season(table: &SalesTable, season: Season) -> Cow<'_, SalesTable> {
    if season == Season::All {
        return Cow::Borrowed(table);
    }

    let filtered: SalesTable = table
        .iter()
        .filter(|record| {
            record
                .month
                .is_some_and(|month| season.contains(month.month()))
        })
        .cloned()
        .collect();

    debug!(
        %season,
        kept = filtered.len(),
        total = table.len(),
        "filtered sales table by season"
    );
    Cow::Owned(filtered)
}
