//! Session Module
//! The state one user carries from upload to render: the parsed table and
//! where it came from. Front-ends own sessions explicitly; nothing here is global.

use crate::charts::{ChartArtifact, FigureSize, RenderError, StaticChartRenderer};
use crate::data::{load_csv, ChartKind, ChartRequest, LoadError, SelectionError, Table};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("No file uploaded")]
    NoFile,
    #[error("No uploaded CSV found. Please upload again.")]
    UploadMissing,
    #[error("Uploaded file missing on server. Please upload again.")]
    UploadGone,
    #[error("Could not store file: {0}")]
    Storage(#[from] std::io::Error),
}

/// Where the user goes after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    Reupload,
    Reselect,
}

impl WorkflowError {
    pub fn recovery(&self) -> Recovery {
        match self {
            WorkflowError::Load(_)
            | WorkflowError::NoFile
            | WorkflowError::UploadMissing
            | WorkflowError::UploadGone => Recovery::Reupload,
            WorkflowError::Selection(_) | WorkflowError::Render(_) | WorkflowError::Storage(_) => {
                Recovery::Reselect
            }
        }
    }

    /// Message shown to the user. Render failures stay generic; their
    /// details only go to the log.
    pub fn user_message(&self) -> String {
        match self {
            WorkflowError::Render(_) => {
                "Could not draw a chart from the selected columns. Try different columns or chart type."
                    .to_string()
            }
            WorkflowError::Storage(_) => "Could not store the file on the server.".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    source: PathBuf,
    table: Table,
}

impl Session {
    /// Load a CSV file and start a session on it.
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let table = load_csv(path)?;
        tracing::info!(
            source = %path.display(),
            rows = table.row_count(),
            columns = table.column_count(),
            "csv loaded"
        );
        Ok(Self {
            source: path.to_path_buf(),
            table,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn columns(&self) -> Vec<String> {
        self.table.columns()
    }

    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    /// Validate a selection against this session's table.
    pub fn request(&self, x: &str, y: &str, kind: ChartKind) -> Result<ChartRequest, SelectionError> {
        ChartRequest::new(&self.table, x, y, kind)
    }

    pub fn render(&self, request: &ChartRequest, size: FigureSize) -> Result<ChartArtifact, RenderError> {
        StaticChartRenderer::render(&self.table, request, size).inspect_err(|err| {
            tracing::error!(
                error = %err,
                source = %self.source.display(),
                title = %request.title(),
                "render failed"
            );
        })
    }

    /// Validate and render in one step.
    pub fn plot(
        &self,
        x: &str,
        y: &str,
        kind: ChartKind,
        size: FigureSize,
    ) -> Result<ChartArtifact, WorkflowError> {
        let request = self.request(x, y, kind)?;
        Ok(self.render(&request, size)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(content: &str) -> (tempfile::TempDir, Session) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, content).unwrap();
        let session = Session::open(&path).unwrap();
        (dir, session)
    }

    #[test]
    fn open_exposes_columns_and_rows() {
        let (_dir, session) = session("a,b\n1,10\n2,20\n3,30\n");
        assert_eq!(session.columns(), vec!["a", "b"]);
        assert_eq!(session.row_count(), 3);
        assert!(session.source().ends_with("data.csv"));
    }

    #[test]
    fn missing_column_yields_selection_error_and_no_artifact() {
        let (_dir, session) = session("a,b\n1,10\n");
        let err = session
            .plot("a", "missing", ChartKind::Line, FigureSize::SERVER)
            .unwrap_err();

        assert!(matches!(err, WorkflowError::Selection(_)));
        assert_eq!(err.recovery(), Recovery::Reselect);
    }

    #[test]
    fn load_failures_send_the_user_back_to_upload() {
        let err = WorkflowError::from(LoadError::UnsupportedExtension("x.txt".into()));
        assert_eq!(err.recovery(), Recovery::Reupload);
        assert_eq!(WorkflowError::UploadMissing.recovery(), Recovery::Reupload);
    }

    #[test]
    fn render_failures_get_a_generic_message() {
        let err = WorkflowError::from(RenderError::Backend("font not found".into()));
        assert!(!err.user_message().contains("font"));
        assert_eq!(err.recovery(), Recovery::Reselect);
    }
}
