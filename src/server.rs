//! HTTP upload boundary.
//!
//! | Route              | Reply                                   |
//! |--------------------|-----------------------------------------|
//! | `GET /`            | upload form                             |
//! | `POST /upload/`    | HTML table of the five fields           |
//! | `POST /api/extract`| the same record as a JSON object        |
//!
//! Both upload routes read the multipart field `file`. The declared content
//! type is checked before a single byte of the file is read, and the read
//! stops as soon as it passes the size limit, so rejected uploads never
//! reach [`Extractor::run`].

use crate::config::ExtractionConfig;
use crate::document::{admit_upload, Document};
use crate::error::ExtractError;
use crate::extract::Extractor;
use crate::present::{render_error_html, render_index_html, render_record_html};
use crate::record::FieldRecord;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info};

/// Multipart framing allowed on top of the document limit.
pub const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Multipart field carrying the document.
pub const FILE_FIELD: &str = "file";

/// Shared application state accessible from all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub extractor: Extractor,
}

impl AppState {
    pub fn new(extractor: Extractor) -> Self {
        Self { extractor }
    }

    fn max_document_bytes(&self) -> usize {
        self.extractor.config().max_document_bytes
    }
}

/// Build the router with every route and the body limit installed.
pub fn router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_document_bytes() + MULTIPART_OVERHEAD);

    Router::new()
        .route("/", get(index))
        .route("/upload/", post(upload_html))
        .route("/api/extract", post(upload_json))
        .layer(body_limit)
        .with_state(Arc::new(state))
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await
}

/// HTTP status for a failed extraction.
pub fn status_for(err: &ExtractError) -> StatusCode {
    match err {
        ExtractError::InvalidDocument { .. }
        | ExtractError::OversizeDocument { .. }
        | ExtractError::FileNotFound { .. }
        | ExtractError::PermissionDenied { .. } => StatusCode::BAD_REQUEST,
        ExtractError::EmptyDocument { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ExtractError::Upstream(_) => StatusCode::BAD_GATEWAY,
        ExtractError::ProviderNotConfigured { .. }
        | ExtractError::InvalidConfig(_)
        | ExtractError::PdfiumBindingFailed(_)
        | ExtractError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON body of a failed `/api/extract` call.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_index_html(state.max_document_bytes()))
}

async fn upload_html(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    match process_upload(&state, multipart).await {
        Ok(record) => Html(render_record_html(&record)).into_response(),
        Err(e) => (status_for(&e), Html(render_error_html(&e))).into_response(),
    }
}

async fn upload_json(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    match process_upload(&state, multipart).await {
        Ok(record) => Json(record).into_response(),
        Err(e) => {
            let body = ErrorBody {
                error: e.reason().as_str(),
                message: e.to_string(),
            };
            (status_for(&e), Json(body)).into_response()
        }
    }
}

async fn process_upload(state: &AppState, multipart: Multipart) -> Result<FieldRecord, ExtractError> {
    let document = read_upload(multipart, state.extractor.config()).await?;
    state.extractor.run(document).await
}

/// Pull the `file` field out of the form and admit it.
async fn read_upload(
    mut multipart: Multipart,
    config: &ExtractionConfig,
) -> Result<Document, ExtractError> {
    let limit = config.max_document_bytes;
    let malformed = |e: axum::extract::multipart::MultipartError| {
        ExtractError::invalid_document(format!("malformed upload: {}", e.body_text()))
    };

    while let Some(mut field) = multipart.next_field().await.map_err(malformed)? {
        if field.name() != Some(FILE_FIELD) {
            // Ignore unknown fields, but not a broken stream.
            field.bytes().await.map_err(malformed)?;
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let media_type = field.content_type().map(str::to_string);

        // Media type first: nothing is read for a wrong type.
        admit_upload(media_type.as_deref(), 0, config)?;

        let mut data = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(malformed)? {
            data.extend_from_slice(&chunk);
            if data.len() > limit {
                return Err(ExtractError::OversizeDocument {
                    size: data.len(),
                    limit,
                });
            }
        }

        info!("Received upload '{}' ({} bytes)", filename, data.len());
        let media_type = media_type.unwrap_or_default();
        debug!("Declared content type: {}", media_type);
        return Ok(Document::new(data, media_type));
    }

    Err(ExtractError::invalid_document(format!(
        "no '{FILE_FIELD}' field in the upload"
    )))
}
