//! Server module - browser form flow
//!
//! `GET /` shows the upload form, `POST /` handles `action=upload` and
//! `action=plot`, and rendered charts are served from `/static`.

mod pages;
mod store;
mod workflow;

pub use store::ArtifactStore;

use crate::charts::FigureSize;
use crate::config::ServeArgs;
use crate::session::WorkflowError;
use anyhow::Context;
use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Router};
use pages::{ColumnChoice, IndexPage};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use workflow::{FormFields, UploadedFile};

/// Shared, read-only request context. Per-user state travels in the form.
#[derive(Clone)]
pub struct AppState {
    store: Arc<ArtifactStore>,
    figure: FigureSize,
}

impl AppState {
    pub fn new(store: ArtifactStore, figure: FigureSize) -> Self {
        Self {
            store: Arc::new(store),
            figure,
        }
    }
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let images = ServeDir::new(state.store.images_dir());

    Router::new()
        .route("/", get(index).post(submit))
        .nest_service("/static", images)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the web form until Ctrl-C.
pub async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let store = ArtifactStore::open(args.uploads_dir(), args.images_dir())
        .with_context(|| format!("creating storage under {}", args.data_dir.display()))?;
    // Files left behind by a run that did not shut down cleanly.
    purge(&store);
    let state = AppState::new(store, FigureSize::SERVER);

    let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port))
        .await
        .with_context(|| format!("binding {}:{}", args.host, args.port))?;
    let url = format!("http://{}", listener.local_addr()?);
    tracing::info!(%url, data_dir = %args.data_dir.display(), "graph visualizer listening");

    if args.open_browser {
        if let Err(err) = open::that(&url) {
            tracing::warn!(error = %err, "could not open browser");
        }
    }

    run(listener, state, args.max_upload_bytes(), shutdown_signal()).await
}

/// Serve on `listener` until `shutdown` resolves, then clear stored files.
async fn run(
    listener: tokio::net::TcpListener,
    state: AppState,
    max_upload_bytes: usize,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = router(state.clone(), max_upload_bytes);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("server error")?;

    purge(&state.store);
    tracing::info!("server stopped");
    Ok(())
}

/// Uploads and charts only live as long as the server run.
fn purge(store: &ArtifactStore) {
    match store.purge() {
        Ok(removed) => tracing::info!(removed, "cleared stored uploads and charts"),
        Err(err) => tracing::warn!(error = %err, "could not clear stored files"),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
    }
}

async fn index() -> Html<String> {
    Html(pages::index(&IndexPage::default()))
}

/// A decoded form post: text fields plus the optional uploaded file.
#[derive(Debug, Default)]
struct Submission {
    fields: FormFields,
    file: Option<UploadedFile>,
}

impl Submission {
    async fn extract(request: Request, state: &AppState) -> Result<Self, String> {
        let is_multipart = request
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(fields) = Form::<FormFields>::from_request(request, state)
                .await
                .map_err(|err| err.body_text())?;
            return Ok(Self { fields, file: None });
        }

        let mut multipart = Multipart::from_request(request, state)
            .await
            .map_err(|err| err.body_text())?;
        let mut submission = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(|err| err.body_text())? {
            let name = field.name().unwrap_or_default().to_string();

            if let Some(file_name) = field.file_name().map(str::to_string) {
                let bytes = field.bytes().await.map_err(|err| err.body_text())?;
                if name == "file" {
                    submission.file = Some(UploadedFile {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
                continue;
            }

            let value = field.text().await.map_err(|err| err.body_text())?;
            let slot = match name.as_str() {
                "action" => &mut submission.fields.action,
                "saved_file" => &mut submission.fields.saved_file,
                "x_column" => &mut submission.fields.x_column,
                "y_column" => &mut submission.fields.y_column,
                "chart_type" => &mut submission.fields.chart_type,
                _ => continue,
            };
            *slot = Some(value);
        }

        Ok(submission)
    }
}

async fn submit(State(state): State<AppState>, request: Request) -> Response {
    let submission = match Submission::extract(request, &state).await {
        Ok(submission) => submission,
        Err(message) => {
            tracing::warn!(%message, "unreadable form submission");
            return page(StatusCode::BAD_REQUEST, Some(message.as_str()), None);
        }
    };

    let action = submission.fields.action.clone();
    match action.as_deref() {
        Some("upload") => upload(state, submission).await,
        Some("plot") => plot(state, submission.fields).await,
        _ => page(StatusCode::OK, None, None),
    }
}

async fn upload(state: AppState, submission: Submission) -> Response {
    let store = state.store.clone();
    let result =
        tokio::task::spawn_blocking(move || workflow::accept_upload(&store, submission.file)).await;

    match result {
        Ok(Ok(choice)) => {
            tracing::info!(reference = %choice.reference, rows = ?choice.rows, "upload accepted");
            page(StatusCode::OK, None, Some(&choice))
        }
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "upload rejected");
            error_page(&err, None)
        }
        Err(err) => internal_error(err),
    }
}

async fn plot(state: AppState, fields: FormFields) -> Response {
    let store = state.store.clone();
    let figure = state.figure;
    let result = tokio::task::spawn_blocking(move || workflow::plot(&store, &fields, figure)).await;

    match result {
        Ok(Ok(plotted)) => {
            tracing::info!(image = %plotted.image_name, title = %plotted.title, "chart served");
            Html(pages::plot(&plotted.image_name, &plotted.title)).into_response()
        }
        Ok(Err(failure)) => {
            tracing::warn!(error = %failure.error, "plot rejected");
            error_page(&failure.error, failure.choice.as_ref())
        }
        Err(err) => internal_error(err),
    }
}

fn page(status: StatusCode, error: Option<&str>, choice: Option<&ColumnChoice>) -> Response {
    (status, Html(pages::index(&IndexPage { error, choice }))).into_response()
}

fn error_page(err: &WorkflowError, choice: Option<&ColumnChoice>) -> Response {
    let status = match err {
        WorkflowError::Render(_) | WorkflowError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };
    let message = err.user_message();
    page(status, Some(message.as_str()), choice)
}

fn internal_error(err: tokio::task::JoinError) -> Response {
    tracing::error!(error = %err, "request worker failed");
    page(
        StatusCode::INTERNAL_SERVER_ERROR,
        Some("Something went wrong. Please try again."),
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const BOUNDARY: &str = "graphvisualizerboundary";

    fn app() -> (tempfile::TempDir, AppState, Router) {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path().join("uploads"), dir.path().join("images")).unwrap();
        let state = AppState::new(store, FigureSize::SERVER);
        let router = router(state.clone(), 1024 * 1024);
        (dir, state, router)
    }

    fn multipart(fields: &[(&str, &str)], file: Option<(&str, &str)>) -> Request {
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        if let Some((file_name, content)) = file {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: text/csv\r\n\r\n{content}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn urlencoded(body: &str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(router: Router, request: Request) -> (StatusCode, String) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn shutdown_clears_stored_uploads_and_charts() {
        let (dir, state, _router) = app();
        let choice = workflow::accept_upload(
            &state.store,
            Some(UploadedFile {
                file_name: "d.csv".to_string(),
                bytes: b"a,b\n1,10\n".to_vec(),
            }),
        )
        .unwrap();
        std::fs::write(dir.path().join("images").join("chart.png"), b"\x89PNG").unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();

        run(listener, state.clone(), 1024, async {}).await.unwrap();

        assert!(state.store.resolve_upload(&choice.reference).is_none());
        assert_eq!(std::fs::read_dir(dir.path().join("images")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn get_shows_the_upload_form() {
        let (_dir, _state, router) = app();
        let request = axum::http::Request::builder().uri("/").body(Body::empty()).unwrap();

        let (status, body) = send(router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("name=\"file\""));
    }

    #[tokio::test]
    async fn upload_lists_columns_and_round_trips_a_reference() {
        let (_dir, _state, router) = app();
        let request = multipart(&[("action", "upload")], Some(("data.csv", "a,b\n1,10\n2,20\n3,30\n")));

        let (status, body) = send(router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<option value=\"a\">a</option>"));
        assert!(body.contains("name=\"saved_file\" value=\""));
        assert!(body.contains("_data.csv\""));
        assert!(body.contains("Rows: 3"));
    }

    #[tokio::test]
    async fn non_csv_upload_is_refused() {
        let (_dir, _state, router) = app();
        let request = multipart(&[("action", "upload")], Some(("notes.txt", "hello")));

        let (status, body) = send(router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Only CSV files allowed"));
    }

    #[tokio::test]
    async fn upload_without_file_is_refused() {
        let (_dir, _state, router) = app();
        let (status, body) = send(router, multipart(&[("action", "upload")], None)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("No file uploaded"));
    }

    #[tokio::test]
    async fn plot_with_unknown_reference_asks_for_reupload() {
        let (_dir, _state, router) = app();
        let request = urlencoded("action=plot&saved_file=..%2Fsecret.csv&x_column=a&y_column=b&chart_type=line");

        let (status, body) = send(router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Please upload again"));
        assert!(!body.contains("x_column"));
    }

    #[tokio::test]
    async fn plot_with_unknown_column_shows_the_column_form_again() {
        let (_dir, state, router) = app();
        let choice = workflow::accept_upload(
            &state.store,
            Some(UploadedFile {
                file_name: "d.csv".to_string(),
                bytes: b"a,b\n1,10\n".to_vec(),
            }),
        )
        .unwrap();
        let request = multipart(
            &[
                ("action", "plot"),
                ("saved_file", &choice.reference),
                ("x_column", "a"),
                ("y_column", "c"),
                ("chart_type", "scatter"),
            ],
            None,
        );

        let (status, body) = send(router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Column &#39;c&#39;"));
        assert!(body.contains(&choice.reference));
    }

    #[tokio::test]
    async fn unknown_action_falls_back_to_the_upload_form() {
        let (_dir, _state, router) = app();
        let (status, body) = send(router, urlencoded("action=dance")).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("name=\"file\""));
    }

    #[tokio::test]
    async fn rendered_chart_is_served_from_static() {
        let (_dir, state, router) = app();
        let choice = workflow::accept_upload(
            &state.store,
            Some(UploadedFile {
                file_name: "d.csv".to_string(),
                bytes: b"a,b\n1,10\n2,20\n3,30\n".to_vec(),
            }),
        )
        .unwrap();
        let body = format!(
            "action=plot&saved_file={}&x_column=a&y_column=b&chart_type=bar",
            choice.reference
        );

        let (status, page) = send(router.clone(), urlencoded(&body)).await;
        assert_eq!(status, StatusCode::OK, "{page}");
        assert!(page.contains("<h1>Bar of b vs a</h1>"));

        let src = page.split("src=\"").nth(1).unwrap().split('"').next().unwrap();
        let image = axum::http::Request::builder().uri(src).body(Body::empty()).unwrap();
        let response = router.oneshot(image).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    }
}
