//! Warehouse adapter for saksflyt: table sources, the deduplicating loader,
//! conversion of warehouse rows into core records, and assembly of the full
//! prepared data set.

pub mod datagrunnlag;
pub mod loader;
pub mod rows;
pub mod source;

use std::path::PathBuf;

use saksflyt_core::SaksflytError;

pub use datagrunnlag::{build_datagrunnlag, Datagrunnlag, DatagrunnlagOptions};
pub use loader::{load_deduplicated, RawRow};
pub use source::{ExportDirSource, MemorySource, TableRef, WarehouseSource};

/// Table holding the case event log.
pub const TABLE_STATISTIKK: &str = "ia-sak-statistikk-v1";
/// Table holding service deliveries.
pub const TABLE_LEVERANSE: &str = "ia-sak-leveranse-v1";
pub const TABLE_SAMARBEID: &str = "samarbeid-v1";
pub const TABLE_SPORREUNDERSOKELSE: &str = "sporreundersokelse-v1";
pub const TABLE_SAMARBEIDSPLAN: &str = "samarbeidsplan-v1";
/// Municipality renumbering from 2023 to 2024. Optional.
pub const TABLE_ADM_ENHETER: &str = "adm-enheter";

#[derive(Debug, thiserror::Error)]
pub enum WarehouseError {
    #[error("no data for table {0}")]
    MissingTable(String),
    #[error("source failed for {table}: {reason}")]
    Source { table: String, reason: String },
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{table} row {index}: {reason}")]
    Record {
        table: String,
        index: usize,
        reason: String,
    },
    #[error(transparent)]
    Core(#[from] SaksflytError),
}
