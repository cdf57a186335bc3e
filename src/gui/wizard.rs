//! Desktop wizard state machine.
//!
//! Welcome -> Upload -> ChooseKind -> ChooseColumns -> Rendered, driven by
//! user actions. The wizard owns the session; screens only read it.

use crate::charts::{ChartArtifact, FigureSize};
use crate::data::ChartKind;
use crate::session::{Session, WorkflowError};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Welcome,
    Upload,
    ChooseKind,
    ChooseColumns,
    Rendered,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Info(String),
    Error(String),
}

pub struct Wizard {
    step: Step,
    session: Option<Session>,
    artifact: Option<ChartArtifact>,
    status: Status,
    figure: FigureSize,
    pub kind: ChartKind,
    pub x_column: String,
    pub y_column: String,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new(FigureSize::DESKTOP)
    }
}

impl Wizard {
    pub fn new(figure: FigureSize) -> Self {
        Self {
            step: Step::Welcome,
            session: None,
            artifact: None,
            status: Status::Idle,
            figure,
            kind: ChartKind::default(),
            x_column: String::new(),
            y_column: String::new(),
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn artifact(&self) -> Option<&ChartArtifact> {
        self.artifact.as_ref()
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn columns(&self) -> Vec<String> {
        self.session.as_ref().map(Session::columns).unwrap_or_default()
    }

    fn expect_step(&self, step: Step, action: &str) -> bool {
        if self.step != step {
            tracing::debug!(?step, current = ?self.step, action, "ignored out-of-order action");
            return false;
        }
        true
    }

    pub fn continue_from_welcome(&mut self) {
        if self.expect_step(Step::Welcome, "continue") {
            self.step = Step::Upload;
        }
    }

    /// Load the chosen file. On failure nothing from the attempt is kept and
    /// the wizard stays on the upload step.
    pub fn load(&mut self, path: &Path) {
        if !self.expect_step(Step::Upload, "load") {
            return;
        }

        match Session::open(path) {
            Ok(session) => {
                self.status = Status::Info(format!("File loaded\nRows: {}", session.row_count()));
                self.session = Some(session);
                self.x_column.clear();
                self.y_column.clear();
                self.kind = ChartKind::default();
                self.step = Step::ChooseKind;
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "csv rejected");
                self.session = None;
                self.status = Status::Error(WorkflowError::from(err).user_message());
            }
        }
    }

    pub fn confirm_kind(&mut self) {
        if self.expect_step(Step::ChooseKind, "confirm kind") {
            self.status = Status::Idle;
            self.step = Step::ChooseColumns;
        }
    }

    /// Validate the column choice and render. Failures keep the table and
    /// stay on the column step so the user can pick again.
    pub fn plot(&mut self) {
        if !self.expect_step(Step::ChooseColumns, "plot") {
            return;
        }
        let Some(session) = &self.session else {
            self.status = Status::Error(WorkflowError::UploadMissing.user_message());
            self.step = Step::Upload;
            return;
        };

        match session.plot(&self.x_column, &self.y_column, self.kind, self.figure) {
            Ok(artifact) => {
                self.artifact = Some(artifact);
                self.status = Status::Info("Graph Generated Successfully!".to_string());
                self.step = Step::Rendered;
            }
            Err(err) => {
                tracing::warn!(error = %err, "plot rejected");
                self.status = Status::Error(err.user_message());
            }
        }
    }

    /// Write the current chart to `path`, adding `.png` when no extension was given.
    pub fn save(&mut self, path: &Path) {
        if !self.expect_step(Step::Rendered, "save") {
            return;
        }
        let Some(artifact) = &self.artifact else {
            return;
        };

        let path = with_default_extension(path);
        match artifact.save_to(&path) {
            Ok(saved) => {
                self.artifact = Some(saved);
                self.status = Status::Info("Graph saved successfully!".to_string());
            }
            Err(err) => {
                tracing::error!(path = %path.display(), error = %err, "saving chart failed");
                self.status = Status::Error(format!("Could not save graph: {err}"));
            }
        }
    }

    /// Back to the column step with the same table.
    pub fn change_columns(&mut self) {
        if self.expect_step(Step::Rendered, "change columns") {
            self.artifact = None;
            self.status = Status::Idle;
            self.step = Step::ChooseColumns;
        }
    }

    /// Drop the session and start again from the upload step.
    pub fn restart(&mut self) {
        self.session = None;
        self.artifact = None;
        self.x_column.clear();
        self.y_column.clear();
        self.kind = ChartKind::default();
        self.status = Status::Idle;
        self.step = Step::Upload;
    }
}

fn with_default_extension(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension("png")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn loaded(dir: &tempfile::TempDir) -> Wizard {
        let mut wizard = Wizard::default();
        wizard.continue_from_welcome();
        wizard.load(&csv(dir, "data.csv", "a,b\n1,10\n2,20\n3,30\n"));
        wizard
    }

    #[test]
    fn starts_on_welcome_and_moves_to_upload() {
        let mut wizard = Wizard::default();
        assert_eq!(wizard.step(), Step::Welcome);

        wizard.continue_from_welcome();
        assert_eq!(wizard.step(), Step::Upload);
    }

    #[test]
    fn successful_load_reports_rows_and_asks_for_kind() {
        let dir = tempfile::tempdir().unwrap();
        let wizard = loaded(&dir);

        assert_eq!(wizard.step(), Step::ChooseKind);
        assert_eq!(wizard.status(), &Status::Info("File loaded\nRows: 3".to_string()));
        assert_eq!(wizard.columns(), vec!["a", "b"]);
        assert_eq!(wizard.kind, ChartKind::Line);
    }

    #[test]
    fn failed_load_stays_on_upload_without_a_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut wizard = Wizard::default();
        wizard.continue_from_welcome();

        wizard.load(&csv(&dir, "bad.csv", "a,b\n1,2\n1,2,3,4,5\n"));

        assert_eq!(wizard.step(), Step::Upload);
        assert!(wizard.session().is_none());
        assert!(matches!(wizard.status(), Status::Error(msg) if msg.contains("Error reading CSV")));
    }

    #[test]
    fn unknown_column_keeps_the_table_and_stays_on_columns() {
        let dir = tempfile::tempdir().unwrap();
        let mut wizard = loaded(&dir);
        wizard.confirm_kind();

        wizard.x_column = "a".to_string();
        wizard.y_column = "zzz".to_string();
        wizard.plot();

        assert_eq!(wizard.step(), Step::ChooseColumns);
        assert!(wizard.session().is_some());
        assert!(wizard.artifact().is_none());
        assert!(matches!(wizard.status(), Status::Error(msg) if msg.contains("zzz")));
    }

    #[test]
    fn empty_selection_asks_for_both_columns() {
        let dir = tempfile::tempdir().unwrap();
        let mut wizard = loaded(&dir);
        wizard.confirm_kind();

        wizard.plot();

        assert_eq!(wizard.step(), Step::ChooseColumns);
        assert!(matches!(wizard.status(), Status::Error(msg) if msg.starts_with("Select both columns")));
    }

    #[test]
    fn plotting_moves_to_rendered_and_restart_clears_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut wizard = loaded(&dir);
        wizard.kind = ChartKind::Bar;
        wizard.confirm_kind();
        wizard.x_column = "a".to_string();
        wizard.y_column = "b".to_string();

        wizard.plot();
        assert_eq!(wizard.step(), Step::Rendered, "{:?}", wizard.status());
        assert!(wizard.artifact().is_some());

        let target = dir.path().join("chart");
        wizard.save(&target);
        let saved = dir.path().join("chart.png");
        assert!(saved.exists());
        assert_eq!(wizard.artifact().and_then(|a| a.location()), Some(saved.as_path()));

        wizard.change_columns();
        assert_eq!(wizard.step(), Step::ChooseColumns);
        assert!(wizard.session().is_some());

        wizard.restart();
        assert_eq!(wizard.step(), Step::Upload);
        assert!(wizard.session().is_none());
        assert!(wizard.artifact().is_none());
    }

    #[test]
    fn out_of_order_actions_are_ignored() {
        let mut wizard = Wizard::default();
        wizard.plot();
        wizard.confirm_kind();
        wizard.change_columns();
        assert_eq!(wizard.step(), Step::Welcome);
    }

    #[test]
    fn save_keeps_an_explicit_extension() {
        assert_eq!(with_default_extension(Path::new("out.jpeg")), PathBuf::from("out.jpeg"));
        assert_eq!(with_default_extension(Path::new("out")), PathBuf::from("out.png"));
    }
}
