//! Command line configuration.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "graph-visualizer", version, about = "Turn a CSV file into a line, bar or scatter chart")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Step-by-step desktop wizard (the default)
    Desktop,
    /// Browser form served over HTTP
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "GRAPH_VISUALIZER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "GRAPH_VISUALIZER_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Directory holding `uploads/` and `images/`
    #[arg(long, default_value = "static")]
    pub data_dir: PathBuf,

    /// Largest accepted upload, in MiB
    #[arg(long, default_value_t = 16)]
    pub max_upload_mb: usize,

    /// Open the form in the default browser once listening
    #[arg(long)]
    pub open_browser: bool,
}

impl ServeArgs {
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    pub fn images_dir(&self) -> PathBuf {
        self.data_dir.join("images")
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}
