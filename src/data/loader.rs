//! CSV Data Loader Module
//! Parses uploaded CSV files into an in-memory [`Table`] using Polars.

use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

/// Rows Polars scans to infer each column's dtype.
const INFER_SCHEMA_ROWS: usize = 10_000;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Only CSV files allowed (got {0})")]
    UnsupportedExtension(String),
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error reading CSV: {0}")]
    Parse(#[from] PolarsError),
}

/// Ordered, equal-length named columns parsed from one CSV file.
#[derive(Debug, Clone)]
pub struct Table {
    df: DataFrame,
}

impl Table {
    pub fn from_dataframe(df: DataFrame) -> Self {
        Self { df }
    }

    /// Column names in header order.
    pub fn columns(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.get_column_names().iter().any(|c| c.as_str() == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.df.column(name).ok()
    }

    pub fn row_count(&self) -> usize {
        self.df.height()
    }

    pub fn column_count(&self) -> usize {
        self.df.width()
    }
}

/// Returns true when the path carries a `.csv` extension (any case).
pub fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Load a CSV file from disk.
///
/// The extension is checked before the file is opened, so a rejected name
/// never touches the file system.
pub fn load_csv(path: &Path) -> Result<Table, LoadError> {
    if !has_csv_extension(path) {
        return Err(LoadError::UnsupportedExtension(path.display().to_string()));
    }

    let bytes = std::fs::read(path)?;
    let table = parse_csv(bytes)?;

    tracing::debug!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.column_count(),
        "parsed csv"
    );
    Ok(table)
}

/// Parse CSV content already held in memory.
///
/// An empty (or whitespace-only) input is a valid table with no columns and
/// no rows. A header without data lines yields its columns and zero rows.
pub fn parse_csv(bytes: Vec<u8>) -> Result<Table, LoadError> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Table::from_dataframe(DataFrame::empty()));
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;

    Ok(Table::from_dataframe(df))
}

/// Whether a dtype can be plotted on a continuous axis.
pub fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &tempfile::TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn columns_follow_header_order_and_rows_match_data_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "people.csv", b"name,age,city\nann,31,oslo\nbo,27,rome\ncy,45,lima\n");

        let table = load_csv(&path).unwrap();

        assert_eq!(table.columns(), vec!["name", "age", "city"]);
        assert_eq!(table.row_count(), 3);
        assert!(table.has_column("age"));
        assert!(!table.has_column("Age"));
    }

    #[test]
    fn header_only_file_is_a_table_with_zero_rows() {
        let table = parse_csv(b"a,b\n".to_vec()).unwrap();
        assert_eq!(table.columns(), vec!["a", "b"]);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn empty_file_is_a_table_with_no_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "empty.csv", b"");

        let table = load_csv(&path).unwrap();
        assert_eq!(table.row_count(), 0);
        assert!(table.columns().is_empty());
    }

    #[test]
    fn extension_is_rejected_before_the_file_is_read() {
        // The path does not exist: an Io error would mean we tried to open it.
        let err = load_csv(Path::new("/nonexistent/data.txt")).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedExtension(_)));
        assert!(err.to_string().contains("Only CSV files allowed"));
    }

    #[test]
    fn uppercase_extension_is_accepted() {
        assert!(has_csv_extension(Path::new("REPORT.CSV")));
        assert!(!has_csv_extension(Path::new("report.csv.txt")));
        assert!(!has_csv_extension(Path::new("csv")));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_csv(&dir.path().join("gone.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }

    #[test]
    fn ragged_content_is_a_parse_error_with_cause() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "broken.csv",
            b"name,age\nann,31\nthis line,has,far,too,many,fields\n",
        );

        let err = load_csv(&path).unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
        assert!(err.to_string().starts_with("Error reading CSV:"));
    }

    #[test]
    fn numeric_dtypes_are_inferred() {
        let table = parse_csv(b"x,y,label\n1,2.5,a\n2,3.5,b\n".to_vec()).unwrap();
        let dtype = |name: &str| table.column(name).unwrap().dtype().clone();

        assert!(is_numeric(&dtype("x")));
        assert!(is_numeric(&dtype("y")));
        assert!(!is_numeric(&dtype("label")));
    }
}
