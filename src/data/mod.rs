//! Data module - CSV loading and column selection

mod loader;
mod selection;

pub use loader::{has_csv_extension, is_numeric, load_csv, parse_csv, LoadError, Table};
pub use selection::{ChartKind, ChartRequest, SelectionError};
