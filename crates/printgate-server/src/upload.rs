// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Multipart upload extraction.
//
// Reads the request body as `multipart/form-data` and keeps the first part
// whose field name matches. Everything else is drained and discarded.
// A request that is not multipart at all simply has no upload.

use actix_multipart::Multipart;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpRequest, web};
use futures_util::StreamExt;
use tracing::debug;

use printgate_core::error::{PrintgateError, Result};
use printgate_core::validation::UploadedFile;

/// Largest payload accepted for a single upload (64 MiB).
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// A file part pulled out of a multipart body.
#[derive(Debug, Clone)]
pub struct FormFile {
    name: String,
    bytes: Vec<u8>,
}

impl FormFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

impl UploadedFile for FormFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_all_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

fn is_multipart(req: &HttpRequest) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("multipart/form-data"))
}

/// Pull the part named `field` out of the request body.
///
/// `Ok(None)` means the request carried no such part. A malformed body or
/// an oversized part is `InvalidBody`.
pub async fn read_upload(
    req: &HttpRequest,
    payload: web::Payload,
    field: &str,
) -> Result<Option<FormFile>> {
    if !is_multipart(req) {
        debug!("request body is not multipart/form-data");
        return Ok(None);
    }

    let mut multipart = Multipart::new(req.headers(), payload);
    let mut found: Option<FormFile> = None;

    while let Some(part) = multipart.next().await {
        let mut part = part.map_err(|e| PrintgateError::InvalidBody(e.to_string()))?;
        let wanted = found.is_none() && part.name() == Some(field);
        let filename = part
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_owned();

        let mut bytes = Vec::new();
        while let Some(chunk) = part.next().await {
            let chunk = chunk.map_err(|e| PrintgateError::InvalidBody(e.to_string()))?;
            if !wanted {
                continue;
            }
            if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(PrintgateError::InvalidBody(format!(
                    "el archivo supera el límite de {MAX_UPLOAD_BYTES} bytes"
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        if wanted {
            debug!(field, filename = %filename, bytes = bytes.len(), "upload part read");
            found = Some(FormFile::new(filename, bytes));
        }
    }

    Ok(found)
}
