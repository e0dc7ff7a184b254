//! Protect and unlock handlers.
//!
//! Both walk the same pipeline: acquire a scoped workspace, stream the upload
//! into it, validate, run the tool, read the produced document back, and
//! respond. The workspace is owned by the handler body, so its directory is
//! removed on every path out - success, validation failure, tool failure, or
//! a propagated error.

use axum::{
    extract::{Multipart, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::AppState;
use crate::errors::{Error, Result};
use crate::ingest;
use crate::qpdf;

/// Apply password protection to an uploaded PDF.
pub async fn protect(State(state): State<AppState>, multipart: Multipart) -> Result<Response> {
    let workspace = state.workspaces.acquire("pdfgate-protect-").await?;
    let form = ingest::ingest_upload(
        multipart,
        workspace.input_path(),
        state.config.upload.max_file_size,
        state.config.tool.default_key_length,
    )
    .await?;

    if form.file_too_large {
        return Err(file_too_large(&state));
    }
    if !form.got_file {
        return Err(Error::BadRequest {
            message: "Missing file.".to_string(),
        });
    }
    // Anything shorter is far too weak to bother encrypting for
    if form.password.chars().count() < 3 {
        return Err(Error::BadRequest {
            message: "Password too short.".to_string(),
        });
    }

    qpdf::protect(
        &state.config.tool,
        workspace.input_path(),
        workspace.output_path(),
        &form.password,
        form.key_length,
    )
    .await?;

    let document = tokio::fs::read(workspace.output_path()).await?;
    tracing::info!(bytes = document.len(), "document protected");
    Ok(pdf_attachment("protected.pdf", document))
}

/// Remove password protection from an uploaded PDF.
pub async fn unlock(State(state): State<AppState>, multipart: Multipart) -> Result<Response> {
    let workspace = state.workspaces.acquire("pdfgate-unlock-").await?;
    let form = ingest::ingest_upload(
        multipart,
        workspace.input_path(),
        state.config.upload.max_file_size,
        state.config.tool.default_key_length,
    )
    .await?;

    if form.file_too_large {
        return Err(file_too_large(&state));
    }
    if !form.got_file {
        return Err(Error::BadRequest {
            message: "Missing file.".to_string(),
        });
    }
    // Real-world documents carry passwords as short as a single character
    if form.password.is_empty() {
        return Err(Error::BadRequest {
            message: "Missing password.".to_string(),
        });
    }

    qpdf::unlock(&state.config.tool, workspace.input_path(), workspace.output_path(), &form.password).await?;

    let document = tokio::fs::read(workspace.output_path()).await?;
    tracing::info!(bytes = document.len(), "document unlocked");
    Ok(pdf_attachment("unlocked.pdf", document))
}

fn file_too_large(state: &AppState) -> Error {
    Error::PayloadTooLarge {
        message: format!("File too large (max {}MB).", state.config.upload.max_file_size / (1024 * 1024)),
    }
}

/// The produced document as a non-cacheable binary attachment.
fn pdf_attachment(filename: &str, document: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        document,
    )
        .into_response()
}
