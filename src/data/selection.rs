//! Column and chart-kind selection.
//! Validates the user's choice against the loaded table before rendering.

use crate::data::Table;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Select both columns ({0} column is missing)")]
    MissingSelection(Axis),
    #[error("Column '{name}' selected for the {axis} axis is not in the CSV")]
    UnknownColumn { axis: Axis, name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "X"),
            Axis::Y => write!(f, "Y"),
        }
    }
}

/// Chart styles offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartKind {
    #[default]
    Line,
    Bar,
    Scatter,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [ChartKind::Line, ChartKind::Bar, ChartKind::Scatter];

    /// Interpret a submitted choice. Unrecognized values fall back to
    /// [`ChartKind::Line`] instead of failing.
    pub fn from_choice(choice: &str) -> Self {
        match choice.trim().to_ascii_lowercase().as_str() {
            "bar" => ChartKind::Bar,
            "scatter" => ChartKind::Scatter,
            "line" => ChartKind::Line,
            other => {
                tracing::debug!(choice = other, "unrecognized chart kind, using line");
                ChartKind::Line
            }
        }
    }

    /// Form value.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Scatter => "scatter",
        }
    }

    /// Title-cased name used in chart titles.
    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::Line => "Line",
            ChartKind::Bar => "Bar",
            ChartKind::Scatter => "Scatter",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChartKind::Line => "Line Plot",
            ChartKind::Bar => "Bar Plot",
            ChartKind::Scatter => "Scatter Plot",
        }
    }
}

/// One validated x/y/kind selection.
///
/// Only constructible through [`ChartRequest::new`], so both columns are known
/// to exist in the table the request was built against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRequest {
    x_column: String,
    y_column: String,
    kind: ChartKind,
}

impl ChartRequest {
    pub fn new(table: &Table, x: &str, y: &str, kind: ChartKind) -> Result<Self, SelectionError> {
        let x = Self::check(table, Axis::X, x)?;
        let y = Self::check(table, Axis::Y, y)?;
        Ok(Self {
            x_column: x.to_string(),
            y_column: y.to_string(),
            kind,
        })
    }

    fn check<'a>(table: &Table, axis: Axis, name: &'a str) -> Result<&'a str, SelectionError> {
        if name.is_empty() {
            return Err(SelectionError::MissingSelection(axis));
        }
        if !table.has_column(name) {
            return Err(SelectionError::UnknownColumn {
                axis,
                name: name.to_string(),
            });
        }
        Ok(name)
    }

    pub fn x_column(&self) -> &str {
        &self.x_column
    }

    pub fn y_column(&self) -> &str {
        &self.y_column
    }

    pub fn kind(&self) -> ChartKind {
        self.kind
    }

    /// "`<Kind>` of `<y>` vs `<x>`"
    pub fn title(&self) -> String {
        format!("{} of {} vs {}", self.kind.title(), self.y_column, self.x_column)
    }
}
