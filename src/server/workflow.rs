//! Upload and plot steps of the web form, independent of HTTP.
//!
//! No table outlives a call: each plot re-opens the stored upload named by
//! the reference the browser sends back.

use crate::charts::FigureSize;
use crate::data::ChartKind;
use crate::server::pages::ColumnChoice;
use crate::server::store::ArtifactStore;
use crate::session::{Session, WorkflowError};
use serde::Deserialize;

/// Text fields of a form submission.
#[derive(Debug, Default, Deserialize)]
pub struct FormFields {
    pub action: Option<String>,
    pub saved_file: Option<String>,
    pub x_column: Option<String>,
    pub y_column: Option<String>,
    pub chart_type: Option<String>,
}

#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
pub struct Plotted {
    pub image_name: String,
    pub title: String,
}

/// A failed plot, plus the column form to show again when the upload is
/// still usable.
#[derive(Debug)]
pub struct PlotFailure {
    pub error: WorkflowError,
    pub choice: Option<ColumnChoice>,
}

impl PlotFailure {
    fn reupload(error: impl Into<WorkflowError>) -> Self {
        Self {
            error: error.into(),
            choice: None,
        }
    }
}

/// Store the upload and parse it. A file that does not parse is removed again.
pub fn accept_upload(
    store: &ArtifactStore,
    file: Option<UploadedFile>,
) -> Result<ColumnChoice, WorkflowError> {
    let file = file
        .filter(|f| !f.file_name.is_empty())
        .ok_or(WorkflowError::NoFile)?;

    let reference = store.save_upload(&file.file_name, &file.bytes)?;
    let path = store
        .resolve_upload(&reference)
        .ok_or(WorkflowError::UploadGone)?;

    match Session::open(&path) {
        Ok(session) => Ok(ColumnChoice {
            reference,
            columns: session.columns(),
            rows: Some(session.row_count()),
        }),
        Err(err) => {
            store.discard_upload(&reference);
            Err(err.into())
        }
    }
}

pub fn plot(
    store: &ArtifactStore,
    fields: &FormFields,
    size: FigureSize,
) -> Result<Plotted, PlotFailure> {
    let reference = fields
        .saved_file
        .as_deref()
        .filter(|r| !r.is_empty())
        .ok_or_else(|| PlotFailure::reupload(WorkflowError::UploadMissing))?;
    let path = store
        .resolve_upload(reference)
        .ok_or_else(|| PlotFailure::reupload(WorkflowError::UploadGone))?;
    let session = Session::open(&path).map_err(PlotFailure::reupload)?;

    let choice = ColumnChoice {
        reference: reference.to_string(),
        columns: session.columns(),
        rows: None,
    };
    let reselect = |error: WorkflowError| PlotFailure {
        error,
        choice: Some(choice.clone()),
    };

    let kind = ChartKind::from_choice(fields.chart_type.as_deref().unwrap_or_default());
    let request = session
        .request(
            fields.x_column.as_deref().unwrap_or_default(),
            fields.y_column.as_deref().unwrap_or_default(),
            kind,
        )
        .map_err(|err| reselect(err.into()))?;
    let artifact = session
        .render(&request, size)
        .map_err(|err| reselect(err.into()))?;
    let (image_name, _) = store
        .save_image(&artifact)
        .map_err(|err| reselect(err.into()))?;

    Ok(Plotted {
        image_name,
        title: request.title(),
    })
}
