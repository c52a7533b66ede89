//! Axum HTTP routes for the conversion service.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::layer::LayerReader;
use crate::pipeline::{ConversionOutcome, Converter, Upload, EXPORT_FILE_NAME, NO_CONTAINER_MESSAGE};
use crate::progress::StoreSink;
use crate::server::state::{AppState, SharedState};
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, Instrument};

/// Media type of the result archive
pub const ZIP_CONTENT_TYPE: &str = "application/x-zip-compressed";

/// Multipart field carrying the archive
const FILE_FIELD: &str = "file";

/// Multipart field carrying the upload id
const UPLOAD_ID_FIELD: &str = "upload_id";

/// Body of `GET /progress/:upload_id`
#[derive(Debug, Serialize)]
struct ProgressResponse {
    progress: u8,
}

// ─── Route builder ───────────────────────────────────────────────

pub fn build_router(state: SharedState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/convert", post(convert))
        .route("/progress/:upload_id", get(progress))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

// ─── Handlers ────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "gdb2xlsx",
    }))
}

async fn convert(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> ServerResult<Response> {
    let mut upload: Option<Upload> = None;
    let mut upload_id: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(FILE_FIELD) => {
                let file_name = field.file_name().map(str::to_string);
                let payload = field.bytes().await?;
                upload = Some(Upload { file_name, payload });
            }
            Some(UPLOAD_ID_FIELD) => upload_id = Some(field.text().await?),
            _ => {}
        }
    }

    let upload_id = upload_id.ok_or(ServerError::MissingField(UPLOAD_ID_FIELD))?;
    let upload = upload.ok_or(ServerError::MissingField(FILE_FIELD))?;

    let sink = StoreSink::new(Arc::clone(&state.progress), upload_id.clone());
    let span = info_span!("convert", upload_id = %upload_id);
    let outcome = state
        .converter
        .convert(upload, &sink)
        .instrument(span)
        .await
        .inspect_err(|e| error!(upload_id = %upload_id, error = %e, "Conversion failed"))?;

    let response = match outcome {
        ConversionOutcome::NoContainer => {
            Json(serde_json::json!({ "error": NO_CONTAINER_MESSAGE })).into_response()
        }
        ConversionOutcome::Archive(archive) => {
            info!(
                upload_id = %upload_id,
                layers = archive.layers.len(),
                bytes = archive.bytes.len(),
                "Sending result archive"
            );
            (
                [
                    (header::CONTENT_TYPE, ZIP_CONTENT_TYPE.to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
                    ),
                ],
                archive.bytes,
            )
                .into_response()
        }
    };
    Ok(response)
}

async fn progress(
    State(state): State<SharedState>,
    Path(upload_id): Path<String>,
) -> impl IntoResponse {
    Json(ProgressResponse {
        progress: state.progress.get(&upload_id),
    })
}

// ─── Server startup ──────────────────────────────────────────────

/// Start the conversion service and run until Ctrl-C
pub async fn serve(config: ServerConfig, reader: Arc<dyn LayerReader>) -> Result<(), ServerError> {
    let converter = Converter::new(reader, config.pipeline.clone());
    let state = Arc::new(AppState::in_memory(
        converter,
        config.progress_ttl,
        config.max_upload_bytes,
    ));

    let router = build_router(state);

    info!(
        addr = %config.addr,
        work_dir = %config.pipeline.work_root.display(),
        layer_delay_ms = config.pipeline.layer_delay.as_millis() as u64,
        max_upload_bytes = config.max_upload_bytes,
        "Conversion service listening"
    );
    info!("Endpoints: POST /convert, GET /progress/:upload_id, GET /health");

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Io)?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down gracefully..."),
        Err(e) => {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}
