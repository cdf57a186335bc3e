//! GUI module - Desktop wizard

mod app;
mod wizard;

pub use app::GraphVisualizerApp;
