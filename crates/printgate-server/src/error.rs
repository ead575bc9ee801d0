// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP mapping for `PrintgateError`.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use printgate_core::error::PrintgateError;

/// JSON error body: `{"error": "..."}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler error; lets route functions use `?` on core results.
#[derive(Debug)]
pub struct ApiError(pub PrintgateError);

impl From<PrintgateError> for ApiError {
    fn from(err: PrintgateError) -> Self {
        Self(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if self.0.is_validation() {
            warn!(error = %self.0, status = status.as_u16(), "request rejected");
        } else {
            error!(error = %self.0, status = status.as_u16(), "request failed");
        }
        HttpResponse::build(status).json(ErrorResponse {
            error: self.0.to_string(),
        })
    }
}
