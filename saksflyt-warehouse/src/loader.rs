//! Deduplicating loader: one row per key, the latest ingested wins.

use chrono::NaiveDateTime;
use saksflyt_core::dedup::{deduplicate_latest, Ingested};
use serde_json::Value;
use tracing::{debug, info};

use crate::rows::timestamp_field;
use crate::{TableRef, WarehouseError, WarehouseSource};

/// A warehouse row together with its ingestion metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub value: Value,
    /// Ingestion instant, `NaiveDateTime::MIN` when the row carries none.
    pub tidsstempel: NaiveDateTime,
    /// Position in the fetched table.
    pub sekvens: u64,
}

impl Ingested for RawRow {
    fn ingested_at(&self) -> NaiveDateTime {
        self.tidsstempel
    }

    fn sequence(&self) -> u64 {
        self.sekvens
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DedupKey {
    Fields(Vec<String>),
    // Rows without a key are never merged.
    Row(u64),
}

/// Fetches `table` and keeps the most recently ingested row per `key`.
///
/// `key` names one or more columns. A row missing any of them is kept as is.
pub fn load_deduplicated<S>(
    source: &S,
    table: &TableRef,
    key: &[&str],
) -> Result<Vec<RawRow>, WarehouseError>
where
    S: WarehouseSource + ?Sized,
{
    let fetched = source.fetch_rows(table)?;
    let fetched_len = fetched.len();

    let mut rows = Vec::with_capacity(fetched_len);
    for (index, value) in fetched.into_iter().enumerate() {
        if !value.is_object() {
            return Err(WarehouseError::Record {
                table: table.table.clone(),
                index,
                reason: "row is not a JSON object".to_string(),
            });
        }
        rows.push(RawRow {
            tidsstempel: timestamp_field(&value, "tidsstempel").unwrap_or(NaiveDateTime::MIN),
            sekvens: index as u64,
            value,
        });
    }

    let kept = deduplicate_latest(rows, |row| {
        let fields: Option<Vec<String>> = key
            .iter()
            .map(|column| row.value.get(*column).and_then(key_text))
            .collect();
        match fields {
            Some(fields) => DedupKey::Fields(fields),
            None => DedupKey::Row(row.sekvens),
        }
    });

    debug!(table = %table, key = ?key, duplicates = fetched_len - kept.len(), "deduplicated");
    info!(table = %table, rows = kept.len(), "loaded table");
    Ok(kept)
}

fn key_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
