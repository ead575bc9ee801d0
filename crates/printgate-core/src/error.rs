// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Printgate.

use thiserror::Error;

/// Top-level error type for all Printgate operations.
///
/// Display strings are what HTTP clients see, so they stay in the language of
/// the label clients that call this service.
#[derive(Debug, Error)]
pub enum PrintgateError {
    // -- Request validation --
    #[error("Este middleware solo es compatible con {0}.")]
    UnsupportedPlatform(String),

    #[error("La petición no contiene el campo '{0}'.")]
    MissingField(String),

    #[error("Nombre de archivo vacío.")]
    EmptyFilename,

    #[error("Tipo de archivo no soportado: '{extension}'. Solo se admiten {supported}.")]
    UnsupportedType { extension: String, supported: String },

    #[error("cuerpo de la petición inválido: {0}")]
    InvalidBody(String),

    // -- Dispatch tiers --
    #[error("herramienta de impresión no encontrada: {0}")]
    PrinterToolNotFound(String),

    #[error("falló el mecanismo de impresión '{tier}': {detail}")]
    PrintMechanismFailed { tier: String, detail: String },

    // -- Printer administration --
    #[error("operación de impresora fallida: {0}")]
    PrinterOperationFailed(String),

    // -- Start-up / persistence --
    #[error("configuración inválida: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PrintgateError {
    /// HTTP status code this error surfaces as.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UnsupportedPlatform(_)
            | Self::MissingField(_)
            | Self::EmptyFilename
            | Self::InvalidBody(_) => 400,
            Self::UnsupportedType { .. } => 415,
            Self::PrinterToolNotFound(_)
            | Self::PrintMechanismFailed { .. }
            | Self::PrinterOperationFailed(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::Serialization(_) => 500,
        }
    }

    /// Whether the request was rejected before any disk or process I/O.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedPlatform(_)
                | Self::MissingField(_)
                | Self::EmptyFilename
                | Self::UnsupportedType { .. }
                | Self::InvalidBody(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PrintgateError>;
