//! Multipart ingestion.
//!
//! Streams an upload without ever holding the whole body in memory: the
//! `file` part is written to the workspace input path chunk by chunk, form
//! fields are captured as they arrive, and everything else is drained and
//! discarded. Reaching the size ceiling mid-stream flags the upload as too
//! large and stops growing the file, but parsing continues to the end of the
//! stream so the client gets a proper response instead of a dropped
//! connection.

use axum::extract::Multipart;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::errors::Result;
use crate::qpdf::KeyLength;

/// Fields extracted from a protect/unlock upload.
#[derive(Debug)]
pub struct UploadForm {
    /// The `password` field, empty when absent
    pub password: String,
    /// The `bits` field coerced to a supported key length
    pub key_length: KeyLength,
    /// Whether a part named `file` appeared at all
    pub got_file: bool,
    /// Whether the file part reached the size ceiling
    pub file_too_large: bool,
}

/// Stream a multipart upload, writing the `file` part to `input_path`.
///
/// `max_file_size` is the admission ceiling in bytes; the routes disable
/// axum's default body limit so this is the only bound on the upload.
pub async fn ingest_upload(
    mut multipart: Multipart,
    input_path: &Path,
    max_file_size: u64,
    default_key_length: KeyLength,
) -> Result<UploadForm> {
    let mut form = UploadForm {
        password: String::new(),
        key_length: default_key_length,
        got_file: false,
        file_too_large: false,
    };

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                form.got_file = true;
                let mut written: u64 = 0;
                let mut out = fs::File::create(input_path).await?;

                while let Some(chunk) = field.chunk().await? {
                    if form.file_too_large {
                        // Already over the ceiling: drain without writing
                        continue;
                    }
                    written += chunk.len() as u64;
                    if written > max_file_size {
                        tracing::debug!(written, max_file_size, "upload exceeded size ceiling");
                        form.file_too_large = true;
                        continue;
                    }
                    out.write_all(&chunk).await?;
                }
                out.flush().await?;
            }
            "password" => {
                form.password = field.text().await?;
            }
            "bits" => {
                form.key_length = KeyLength::from_field(&field.text().await?);
            }
            _ => {
                // Unrecognized part: drain and discard
                while field.chunk().await?.is_some() {}
            }
        }
    }

    Ok(form)
}
