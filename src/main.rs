//! Graph Visualizer - turn a CSV file into a line, bar or scatter chart
//!
//! Runs either as a desktop wizard or as a small web form.

mod charts;
mod config;
mod data;
mod gui;
mod server;
mod session;
mod telemetry;

use anyhow::{anyhow, Context};
use clap::Parser;
use config::{Cli, Command};
use eframe::egui;
use gui::GraphVisualizerApp;

fn main() -> anyhow::Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Serve(args)) => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("starting async runtime")?;
            runtime.block_on(server::serve(args))
        }
        Some(Command::Desktop) | None => run_desktop(),
    }
}

fn run_desktop() -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Graph Visualizer"),
        ..Default::default()
    };

    tracing::info!("starting desktop wizard");
    eframe::run_native(
        "Graph Visualizer",
        options,
        Box::new(|cc| Ok(Box::new(GraphVisualizerApp::new(cc)))),
    )
    .map_err(|err| anyhow!("desktop window failed: {err}"))
}
