use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::error::DataFormatError;
use super::raw_table::RawSalesTable;
use super::types::SalesTable;
use crate::normalize::normalize;

/// Content hash of a raw table.
pub type TableHash = [u8; 32];

/// Memoizes normalization by the content of the raw table.
///
/// Failed normalizations are not stored, so a corrected table is retried.
#[derive(Debug, Default)]
pub struct NormalizedTableCache {
    tables: Mutex<HashMap<TableHash, Arc<SalesTable>>>,
}

impl NormalizedTableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached normalized table for `raw`, normalizing on a miss.
    pub fn get_or_normalize(&self, raw: &RawSalesTable) -> Result<Arc<SalesTable>, DataFormatError> {
        let key = content_hash(raw);
        if let Some(table) = self.tables.lock().get(&key) {
            debug!(rows = table.len(), "normalized table cache hit");
            return Ok(Arc::clone(table));
        }

        // Normalize outside the lock; a concurrent miss on the same key does
        // the work twice and the later insert wins.
        let table = Arc::new(normalize(raw)?);
        self.tables.lock().insert(key, Arc::clone(&table));
        debug!(rows = table.len(), "normalized table cached");
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.tables.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.lock().is_empty()
    }

    pub fn clear(&self) {
        self.tables.lock().clear();
    }
}

/// blake3 over the column mapping, missing columns and every cell.
pub fn content_hash(raw: &RawSalesTable) -> TableHash {
    let mut hasher = blake3::Hasher::new();
    for name in raw.columns().all() {
        update_str(&mut hasher, Some(name));
    }
    hasher.update(&(raw.missing_columns().len() as u64).to_le_bytes());
    for name in raw.missing_columns() {
        update_str(&mut hasher, Some(name.as_str()));
    }
    hasher.update(&(raw.len() as u64).to_le_bytes());
    for row in raw.rows() {
        update_str(&mut hasher, row.product_code.as_deref());
        update_str(&mut hasher, row.product_description.as_deref());
        update_str(&mut hasher, row.month.as_deref());
        match row.quantity {
            Some(q) => {
                hasher.update(&[1]);
                hasher.update(&q.to_bits().to_le_bytes());
            }
            None => {
                hasher.update(&[0]);
            }
        }
    }
    *hasher.finalize().as_bytes()
}

/// Length-prefixed so adjacent cells cannot run together.
fn update_str(hasher: &mut blake3::Hasher, value: Option<&str>) {
    match value {
        Some(s) => {
            hasher.update(&[1]);
            hasher.update(&(s.len() as u64).to_le_bytes());
            hasher.update(s.as_bytes());
        }
        None => {
            hasher.update(&[0]);
        }
    }
}
