//! Charts module - Chart geometry and rendering

mod plan;
mod renderer;

pub use plan::{ChartPlan, Mark, XScale};
pub use renderer::{ChartArtifact, FigureSize, RenderError, StaticChartRenderer};
