// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP routes.
//
//   GET  /                          health check (plain text)
//   GET  /printers                  ready printers as JSON
//   POST /impresora/predeterminada  {"nombre": "..."} sets the default printer
//   POST /print-pdf                 multipart field `file`, .pdf or .txt

use actix_web::{HttpRequest, HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use printgate_core::error::PrintgateError;
use printgate_core::types::PrintJob;
use printgate_core::validation::{UPLOAD_FIELD, UploadedFile};

use crate::error::{ApiError, ErrorResponse};
use crate::state::AppState;
use crate::upload::read_upload;

pub const HEALTH_TEXT: &str = "Middleware de impresión activo";
pub const PRINT_ACCEPTED_TEXT: &str = "Archivo enviado a impresión";

/// Body of `POST /impresora/predeterminada`.
#[derive(Debug, Deserialize)]
pub struct SetPrinterRequest {
    pub nombre: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub mensaje: String,
}

/// Register every route on `cfg`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(health))
        .route("/printers", web::get().to(list_printers))
        .route("/impresora/predeterminada", web::post().to(set_default_printer))
        .route("/print-pdf", web::post().to(print_document));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(HEALTH_TEXT)
}

async fn list_printers(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.discovery.list_ready().await)
}

async fn set_default_printer(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let nombre = parse_printer_name(&body)?;

    if !state.discovery.set_as_default(&nombre).await? {
        return Ok(HttpResponse::NotFound().json(ErrorResponse {
            error: format!("No se encontró ninguna impresora con el nombre '{nombre}'."),
        }));
    }

    // The registry persists with fsync + rename; keep that off the worker.
    let registry_state = state.clone();
    let selected = nombre.clone();
    web::block(move || registry_state.registry.set_current(&selected))
        .await
        .map_err(|e| PrintgateError::PrinterOperationFailed(e.to_string()))?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        mensaje: format!("Impresora '{nombre}' establecida como predeterminada."),
    }))
}

/// Extract a non-blank `nombre` from a JSON body.
fn parse_printer_name(body: &[u8]) -> Result<String, PrintgateError> {
    let missing = || PrintgateError::MissingField("nombre".into());
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(missing());
    }
    let request: SetPrinterRequest =
        serde_json::from_slice(body).map_err(|e| PrintgateError::InvalidBody(e.to_string()))?;
    request
        .nombre
        .map(|n| n.trim().to_owned())
        .filter(|n| !n.is_empty())
        .ok_or_else(missing)
}

async fn print_document(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse, ApiError> {
    state.validator.validate_platform()?;

    for (name, value) in req.headers() {
        debug!(header = %name, value = ?value, "print request header");
    }

    let upload = read_upload(&req, payload, UPLOAD_FIELD).await?;
    let upload = state.validator.validate_payload(upload.as_ref())?;
    let file_type = state.validator.validate_extension(upload.name())?;

    let bytes = upload.read_all_bytes();
    let temp_path = state.temp_files.persist(upload.name(), bytes).await?;
    let job = PrintJob::new(upload.name(), temp_path.clone(), file_type, bytes);

    let printer = state.registry.current();
    let report = state.dispatcher.dispatch(&job, &printer).await;
    state.temp_files.schedule_cleanup(temp_path);

    info!(
        job_id = %job.id,
        printer = %printer,
        completed_by = ?report.completed_by(),
        attempts = report.attempts.len(),
        "print request handled"
    );
    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(PRINT_ACCEPTED_TEXT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printer_name_is_trimmed() {
        assert_eq!(parse_printer_name(br#"{"nombre":"  PT-950NW "}"#).unwrap(), "PT-950NW");
    }

    #[test]
    fn blank_or_absent_name_is_missing_field() {
        let bodies: [&[u8]; 5] = [b"", b"  ", br#"{}"#, br#"{"nombre":""}"#, br#"{"nombre":null}"#];
        for body in bodies {
            assert!(matches!(
                parse_printer_name(body),
                Err(PrintgateError::MissingField(f)) if f == "nombre"
            ));
        }
    }

    #[test]
    fn malformed_json_is_invalid_body() {
        assert!(matches!(
            parse_printer_name(b"{nombre"),
            Err(PrintgateError::InvalidBody(_))
        ));
    }
}
