use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::WarehouseError;

/// Fully qualified warehouse table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub project: String,
    pub dataset: String,
    pub table: String,
}

impl TableRef {
    pub fn new(
        project: impl Into<String>,
        dataset: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            dataset: dataset.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

/// Anything that can hand back every row of a table as JSON objects.
pub trait WarehouseSource {
    fn fetch_rows(&self, table: &TableRef) -> Result<Vec<Value>, WarehouseError>;
}

/// Reads table exports from a directory: `<table>.json` holding an array, or
/// `<table>.ndjson` with one object per line.
#[derive(Debug, Clone)]
pub struct ExportDirSource {
    root: PathBuf,
}

impl ExportDirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_array(path: &Path) -> Result<Vec<Value>, WarehouseError> {
        let text = read(path)?;
        serde_json::from_str(&text).map_err(|source| WarehouseError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    fn read_lines(path: &Path) -> Result<Vec<Value>, WarehouseError> {
        let text = read(path)?;
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|source| WarehouseError::Json {
                    path: path.to_path_buf(),
                    source,
                })
            })
            .collect()
    }
}

fn read(path: &Path) -> Result<String, WarehouseError> {
    fs::read_to_string(path).map_err(|source| WarehouseError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl WarehouseSource for ExportDirSource {
    fn fetch_rows(&self, table: &TableRef) -> Result<Vec<Value>, WarehouseError> {
        if !self.root.is_dir() {
            return Err(WarehouseError::Source {
                table: table.to_string(),
                reason: format!("export directory {} does not exist", self.root.display()),
            });
        }

        let array = self.root.join(format!("{}.json", table.table));
        let lines = self.root.join(format!("{}.ndjson", table.table));

        let rows = if array.is_file() {
            Self::read_array(&array)?
        } else if lines.is_file() {
            Self::read_lines(&lines)?
        } else {
            return Err(WarehouseError::MissingTable(table.to_string()));
        };

        debug!(table = %table, rows = rows.len(), "read table export");
        Ok(rows)
    }
}

/// In-memory tables keyed by table name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: HashMap<String, Vec<Value>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: impl Into<String>, rows: Vec<Value>) -> Self {
        self.tables.insert(table.into(), rows);
        self
    }
}

impl WarehouseSource for MemorySource {
    fn fetch_rows(&self, table: &TableRef) -> Result<Vec<Value>, WarehouseError> {
        self.tables
            .get(&table.table)
            .cloned()
            .ok_or_else(|| WarehouseError::MissingTable(table.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;

    #[test]
    fn table_ref_formats_as_qualified_name() {
        let table = TableRef::new("pia-prod", "ia_sak", "ia-sak-leveranse-v1");
        assert_eq!(table.to_string(), "pia-prod.ia_sak.ia-sak-leveranse-v1");
    }

    #[test]
    fn reads_array_and_line_exports() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.json"), r#"[{"id": "1"}, {"id": "2"}]"#).unwrap();
        let mut lines = fs::File::create(dir.path().join("b.ndjson")).unwrap();
        writeln!(lines, r#"{{"id": "3"}}"#).unwrap();
        writeln!(lines).unwrap();
        writeln!(lines, r#"{{"id": "4"}}"#).unwrap();

        let source = ExportDirSource::new(dir.path());

        let a = source.fetch_rows(&TableRef::new("p", "d", "a")).unwrap();
        let b = source.fetch_rows(&TableRef::new("p", "d", "b")).unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(b, vec![json!({"id": "3"}), json!({"id": "4"})]);
    }

    #[test]
    fn missing_export_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let source = ExportDirSource::new(dir.path());

        let err = source
            .fetch_rows(&TableRef::new("p", "d", "nope"))
            .unwrap_err();

        assert!(matches!(err, WarehouseError::MissingTable(name) if name == "p.d.nope"));
    }

    #[test]
    fn missing_directory_is_a_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = ExportDirSource::new(dir.path().join("gone"));

        let err = source.fetch_rows(&TableRef::new("p", "d", "a")).unwrap_err();

        assert!(matches!(err, WarehouseError::Source { .. }));
    }

    #[test]
    fn malformed_json_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), "[{").unwrap();

        let err = ExportDirSource::new(dir.path())
            .fetch_rows(&TableRef::new("p", "d", "bad"))
            .unwrap_err();

        assert!(err.to_string().contains("bad.json"));
    }
}
