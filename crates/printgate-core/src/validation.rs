// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pre-dispatch request checks.
//
// All checks are pure: they run before any temp file is written or process
// spawned, in the order platform -> payload -> extension.

use crate::config::AppConfig;
use crate::error::{PrintgateError, Result};
use crate::types::{FileType, extension_of};

/// Multipart form field that carries the document.
pub const UPLOAD_FIELD: &str = "file";

/// An uploaded file as seen by the core, independent of the web framework.
pub trait UploadedFile {
    fn name(&self) -> &str;
    fn read_all_bytes(&self) -> &[u8];
}

/// Checks a print request before anything touches the disk.
#[derive(Debug, Clone)]
pub struct RequestValidator {
    target_os: String,
    host_os: String,
    supported_extensions: Vec<String>,
}

impl RequestValidator {
    /// Validator for the running host.
    pub fn new(target_os: impl Into<String>, supported_extensions: Vec<String>) -> Self {
        Self::with_host_os(target_os, std::env::consts::OS, supported_extensions)
    }

    /// Validator that pretends to run on `host_os`.
    pub fn with_host_os(
        target_os: impl Into<String>,
        host_os: impl Into<String>,
        supported_extensions: Vec<String>,
    ) -> Self {
        Self {
            target_os: target_os.into(),
            host_os: host_os.into(),
            supported_extensions: supported_extensions
                .into_iter()
                .map(|e| e.to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.target_os.clone(), config.supported_extensions.clone())
    }

    pub fn validate_platform(&self) -> Result<()> {
        if self.host_os.eq_ignore_ascii_case(&self.target_os) {
            Ok(())
        } else {
            Err(PrintgateError::UnsupportedPlatform(self.target_os.clone()))
        }
    }

    /// Require an attached file with a non-empty name.
    pub fn validate_payload<'a, F: UploadedFile>(&self, upload: Option<&'a F>) -> Result<&'a F> {
        let upload = upload.ok_or_else(|| PrintgateError::MissingField(UPLOAD_FIELD.into()))?;
        if upload.name().is_empty() {
            return Err(PrintgateError::EmptyFilename);
        }
        Ok(upload)
    }

    /// Accept only supported extensions, case-insensitively.
    pub fn validate_extension(&self, filename: &str) -> Result<FileType> {
        let extension = extension_of(filename);
        let supported = self.supported_extensions.iter().any(|e| *e == extension);
        match FileType::from_extension(&extension) {
            Some(file_type) if supported => Ok(file_type),
            _ => Err(PrintgateError::UnsupportedType {
                extension,
                supported: self.supported_extensions.join(", "),
            }),
        }
    }
}
