//! Chart Plan Module
//! Turns a table plus a validated request into plot geometry: the points in
//! row order, axis ranges, and the marks each chart kind draws.

use crate::charts::RenderError;
use crate::data::{is_numeric, ChartKind, ChartRequest, Table};
use polars::prelude::*;
use std::collections::HashMap;
use std::ops::Range;

/// Bar width relative to the spacing between neighbouring x positions.
pub const BAR_WIDTH_RATIO: f64 = 0.8;

/// Fraction of the data span added on each side of an axis.
const AXIS_MARGIN: f64 = 0.05;

/// How x values are placed on the horizontal axis.
#[derive(Debug, Clone, PartialEq)]
pub enum XScale {
    Numeric,
    /// Textual x values: distinct labels in first-appearance order, placed at 0, 1, 2, ...
    Categorical(Vec<String>),
}

/// One drawable element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mark {
    Point { x: f64, y: f64 },
    Bar { left: f64, right: f64, top: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPlan {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_scale: XScale,
    /// (x, y) per plotted row, in row order.
    pub points: Vec<(f64, f64)>,
    /// Rows dropped because the x or y cell was empty or not finite.
    pub skipped_rows: usize,
}

impl ChartPlan {
    pub fn build(table: &Table, request: &ChartRequest) -> Result<Self, RenderError> {
        let x_column = lookup(table, request.x_column())?;
        let y_column = lookup(table, request.y_column())?;

        let ys = numeric_values(y_column)?;
        let (x_scale, xs) = if is_numeric(x_column.dtype()) {
            (XScale::Numeric, numeric_values(x_column)?)
        } else {
            categorical_positions(x_column)?
        };

        let mut points = Vec::with_capacity(ys.len());
        let mut skipped_rows = 0;
        for (x, y) in xs.into_iter().zip(ys) {
            match (x, y) {
                (Some(x), Some(y)) if x.is_finite() && y.is_finite() => points.push((x, y)),
                _ => skipped_rows += 1,
            }
        }

        if skipped_rows > 0 {
            tracing::warn!(
                skipped_rows,
                x = request.x_column(),
                y = request.y_column(),
                "rows with empty cells left out of the chart"
            );
        }

        let plan = Self {
            kind: request.kind(),
            title: request.title(),
            x_label: request.x_column().to_string(),
            y_label: request.y_column().to_string(),
            x_scale,
            points,
            skipped_rows,
        };
        plan.ranges()?;
        Ok(plan)
    }

    /// Both axis ranges, or an error when the data cannot fit on a finite axis.
    pub fn ranges(&self) -> Result<(Range<f64>, Range<f64>), RenderError> {
        let x = self.x_range();
        if !is_drawable(&x) {
            return Err(RenderError::RangeOverflow(self.x_label.clone()));
        }
        let y = self.y_range();
        if !is_drawable(&y) {
            return Err(RenderError::RangeOverflow(self.y_label.clone()));
        }
        Ok((x, y))
    }

    /// Marks drawn for this chart: one per plotted row for every kind.
    pub fn marks(&self) -> Vec<Mark> {
        match self.kind {
            ChartKind::Bar => {
                let half = self.bar_width() / 2.0;
                self.points
                    .iter()
                    .map(|&(x, y)| Mark::Bar {
                        left: x - half,
                        right: x + half,
                        top: y,
                    })
                    .collect()
            }
            ChartKind::Line | ChartKind::Scatter => self
                .points
                .iter()
                .map(|&(x, y)| Mark::Point { x, y })
                .collect(),
        }
    }

    /// Line charts join consecutive points in row order.
    pub fn connects_points(&self) -> bool {
        self.kind == ChartKind::Line
    }

    /// Bar width in x units: a fraction of the narrowest gap between distinct x positions.
    pub fn bar_width(&self) -> f64 {
        let mut xs: Vec<f64> = self.points.iter().map(|p| p.0).collect();
        xs.sort_by(|a, b| a.total_cmp(b));
        xs.dedup();

        let gap = xs
            .windows(2)
            .map(|w| w[1] - w[0])
            .fold(f64::INFINITY, f64::min);

        if gap.is_finite() && gap > 0.0 {
            BAR_WIDTH_RATIO * gap
        } else {
            BAR_WIDTH_RATIO
        }
    }

    pub fn x_range(&self) -> Range<f64> {
        match &self.x_scale {
            XScale::Categorical(categories) => -0.5..(categories.len().max(1) as f64 - 0.5),
            XScale::Numeric => {
                let Some((lo, hi)) = bounds(self.points.iter().map(|p| p.0)) else {
                    return 0.0..1.0;
                };
                let half = if self.kind == ChartKind::Bar {
                    self.bar_width() / 2.0
                } else {
                    0.0
                };
                padded(lo - half, hi + half)
            }
        }
    }

    pub fn y_range(&self) -> Range<f64> {
        let Some((lo, hi)) = bounds(self.points.iter().map(|p| p.1)) else {
            return 0.0..1.0;
        };

        if self.kind != ChartKind::Bar {
            return padded(lo, hi);
        }

        // Bars grow from zero, so zero stays on the axis without extra margin.
        let range = padded(lo.min(0.0), hi.max(0.0));
        let start = if lo >= 0.0 { 0.0 } else { range.start };
        let end = if hi <= 0.0 { 0.0 } else { range.end };
        if end > start {
            start..end
        } else {
            range
        }
    }

    /// Tick label for a categorical x position; `None` on a numeric axis.
    pub fn category_label(&self, value: f64) -> Option<String> {
        let XScale::Categorical(categories) = &self.x_scale else {
            return None;
        };
        let index = value.round();
        if (value - index).abs() > 1e-6 || index < 0.0 {
            return Some(String::new());
        }
        Some(categories.get(index as usize).cloned().unwrap_or_default())
    }
}

fn lookup<'a>(table: &'a Table, name: &str) -> Result<&'a Column, RenderError> {
    table
        .column(name)
        .ok_or_else(|| RenderError::MissingColumn(name.to_string()))
}

/// Values of a column as f64. Text that does not parse as a number is rejected.
fn numeric_values(column: &Column) -> Result<Vec<Option<f64>>, RenderError> {
    let series = column.as_materialized_series();
    let floats = series
        .strict_cast(&DataType::Float64)
        .map_err(|_| RenderError::NonNumeric {
            column: series.name().to_string(),
            dtype: series.dtype().to_string(),
        })?;
    let values = floats.f64()?;
    Ok(values.into_iter().collect())
}

fn categorical_positions(column: &Column) -> Result<(XScale, Vec<Option<f64>>), RenderError> {
    let series = column.as_materialized_series().cast(&DataType::String)?;
    let labels = series.str()?;

    let mut categories: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut positions = Vec::with_capacity(labels.len());

    for label in labels.into_iter() {
        let position = label.map(|label| {
            let slot = *index.entry(label.to_string()).or_insert_with(|| {
                categories.push(label.to_string());
                categories.len() - 1
            });
            slot as f64
        });
        positions.push(position);
    }

    Ok((XScale::Categorical(categories), positions))
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

fn padded(lo: f64, hi: f64) -> Range<f64> {
    // Halved first: `hi - lo` overflows for values near the ends of f64.
    let half_span = hi / 2.0 - lo / 2.0;
    let scale = lo.abs().max(hi.abs());
    let margin = if half_span > scale * 1e-9 {
        half_span * 2.0 * AXIS_MARGIN
    } else {
        (scale * AXIS_MARGIN).max(0.5)
    };
    (lo - margin)..(hi + margin)
}

fn is_drawable(range: &Range<f64>) -> bool {
    range.start.is_finite()
        && range.end.is_finite()
        && (range.end - range.start).is_finite()
        && range.end > range.start
}
