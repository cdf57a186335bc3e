//! Static Chart Renderer
//! Draws a [`ChartPlan`] into a PNG image with plotters.
//!
//! Layout:
//! 1. Title: "{Kind} of {y} vs {x}" centered on top
//! 2. Plot area with background grid, x label below, y label on the left
//! 3. Marks: line (connected, marked points), bar, or scatter

use crate::charts::{ChartPlan, Mark, XScale};
use crate::data::{ChartRequest, Table};
use image::{ImageFormat, RgbImage};
use plotters::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Colors (RGB)
const BACKGROUND: RGBColor = RGBColor(255, 255, 255);
const SERIES: RGBColor = RGBColor(31, 119, 180);
const GRID_BOLD: RGBColor = RGBColor(200, 200, 200);
const GRID_LIGHT: RGBColor = RGBColor(235, 235, 235);

const FONT: &str = "sans-serif";
const TITLE_SIZE: u32 = 22;
const LABEL_SIZE: u32 = 16;
const MARKER_RADIUS: u32 = 4;

/// Pixels per figure inch.
pub const DPI: u32 = 100;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Column '{column}' holds {dtype} values that cannot be plotted as numbers")]
    NonNumeric { column: String, dtype: String },
    #[error("Values of '{0}' span too wide a range to draw")]
    RangeOverflow(String),
    #[error("Column '{0}' is not in the loaded table")]
    MissingColumn(String),
    #[error("Data error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
    #[error("Plotting failed: {0}")]
    Backend(String),
    #[error("Failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
}

impl RenderError {
    fn backend(err: impl std::fmt::Display) -> Self {
        RenderError::Backend(err.to_string())
    }
}

/// Figure size in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FigureSize {
    pub width_in: f32,
    pub height_in: f32,
}

impl FigureSize {
    /// 8x5 inches, used for server-rendered charts.
    pub const SERVER: FigureSize = FigureSize {
        width_in: 8.0,
        height_in: 5.0,
    };
    /// 10x6 inches, used for the desktop wizard.
    pub const DESKTOP: FigureSize = FigureSize {
        width_in: 10.0,
        height_in: 6.0,
    };

    pub fn pixels(&self) -> (u32, u32) {
        (
            (self.width_in * DPI as f32).round() as u32,
            (self.height_in * DPI as f32).round() as u32,
        )
    }
}

/// A rendered chart image.
///
/// Created by [`StaticChartRenderer::render`]; never modified afterwards.
/// `location` is set once the bytes have been written somewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartArtifact {
    png: Vec<u8>,
    width: u32,
    height: u32,
    location: Option<PathBuf>,
}

impl ChartArtifact {
    pub fn png(&self) -> &[u8] {
        &self.png
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// Write the PNG to `path`, returning the artifact tagged with that location.
    pub fn save_to(&self, path: &Path) -> std::io::Result<ChartArtifact> {
        std::fs::write(path, &self.png)?;
        tracing::info!(path = %path.display(), bytes = self.png.len(), "chart saved");
        Ok(ChartArtifact {
            location: Some(path.to_path_buf()),
            ..self.clone()
        })
    }

    /// Decode back into RGBA pixels, e.g. for on-screen display.
    pub fn to_rgba(&self) -> Result<image::RgbaImage, RenderError> {
        Ok(image::load_from_memory_with_format(&self.png, ImageFormat::Png)?.to_rgba8())
    }
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render the requested columns of `table` as a PNG artifact.
    pub fn render(
        table: &Table,
        request: &ChartRequest,
        size: FigureSize,
    ) -> Result<ChartArtifact, RenderError> {
        let plan = ChartPlan::build(table, request)?;
        Self::render_plan(&plan, size)
    }

    pub fn render_plan(plan: &ChartPlan, size: FigureSize) -> Result<ChartArtifact, RenderError> {
        let (width, height) = size.pixels();
        let mut buffer = vec![0u8; width as usize * height as usize * 3];

        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            Self::draw(&root, plan)?;
            root.present().map_err(RenderError::backend)?;
        }

        let image = RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| RenderError::Backend("pixel buffer size mismatch".to_string()))?;
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        tracing::info!(
            title = %plan.title,
            marks = plan.points.len(),
            width,
            height,
            "chart rendered"
        );

        Ok(ChartArtifact {
            png,
            width,
            height,
            location: None,
        })
    }

    fn draw<DB: DrawingBackend>(
        root: &DrawingArea<DB, plotters::coord::Shift>,
        plan: &ChartPlan,
    ) -> Result<(), RenderError> {
        let (x_range, y_range) = plan.ranges()?;
        root.fill(&BACKGROUND).map_err(RenderError::backend)?;

        let mut chart = ChartBuilder::on(root)
            .caption(plan.title.as_str(), (FONT, TITLE_SIZE).into_font())
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range, y_range)
            .map_err(RenderError::backend)?;

        let category_label = |value: &f64| plan.category_label(*value).unwrap_or_default();

        let mut mesh = chart.configure_mesh();
        mesh.x_desc(plan.x_label.as_str())
            .y_desc(plan.y_label.as_str())
            .axis_desc_style((FONT, LABEL_SIZE).into_font())
            .bold_line_style(GRID_BOLD)
            .light_line_style(GRID_LIGHT);
        if let XScale::Categorical(categories) = &plan.x_scale {
            mesh.x_labels(categories.len().max(1) * 2 + 1)
                .x_label_formatter(&category_label);
        }
        mesh.draw().map_err(RenderError::backend)?;

        if plan.connects_points() {
            chart
                .draw_series(LineSeries::new(
                    plan.points.iter().copied(),
                    SERIES.stroke_width(2),
                ))
                .map_err(RenderError::backend)?;
        }

        let marks = plan.marks();
        chart
            .draw_series(marks.iter().filter_map(|mark| match *mark {
                Mark::Point { x, y } => Some(Circle::new((x, y), MARKER_RADIUS, SERIES.filled())),
                Mark::Bar { .. } => None,
            }))
            .map_err(RenderError::backend)?;
        chart
            .draw_series(marks.iter().filter_map(|mark| match *mark {
                Mark::Bar { left, right, top } => {
                    Some(Rectangle::new([(left, 0.0), (right, top)], SERIES.filled()))
                }
                Mark::Point { .. } => None,
            }))
            .map_err(RenderError::backend)?;

        Ok(())
    }
}
