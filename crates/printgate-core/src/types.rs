// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Printgate print middleware.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{PrintgateError, Result};

/// Unique identifier for a print job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Supported upload classifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    /// Plain text, piped straight to the printer.
    Text,
    /// PDF, rendered by a silent-print viewer.
    Pdf,
}

impl FileType {
    /// Infer the type from a lowercased, dot-prefixed extension (".pdf").
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            ".txt" => Some(Self::Text),
            ".pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Pdf => f.write_str("pdf"),
        }
    }
}

/// Lowercased, dot-prefixed extension of `filename`, or an empty string.
///
/// A bare dotfile such as `.pdf` has no extension.
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}

/// A single upload on its way to the printer.
#[derive(Debug, Clone)]
pub struct PrintJob {
    pub id: JobId,
    /// Client-supplied name; only used to derive `file_type`.
    pub source_filename: String,
    /// Where the payload was persisted for the print tiers to read.
    pub temp_path: PathBuf,
    pub file_type: FileType,
    /// SHA-256 of the payload, hex encoded.
    pub document_hash: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

impl PrintJob {
    pub fn new(
        source_filename: impl Into<String>,
        temp_path: PathBuf,
        file_type: FileType,
        bytes: &[u8],
    ) -> Self {
        Self {
            id: JobId::new(),
            source_filename: source_filename.into(),
            temp_path,
            file_type,
            document_hash: hex::encode(Sha256::digest(bytes)),
            size_bytes: bytes.len() as u64,
            created_at: Utc::now(),
        }
    }
}

/// `Win32_Printer.PrinterStatus` value for an idle printer.
pub const PRINTER_STATUS_IDLE: u16 = 3;

/// `Win32_Printer.PrinterStatus` value for a printer currently printing.
pub const PRINTER_STATUS_PRINTING: u16 = 4;

/// A printer as reported by the OS, before any filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "PortName", default)]
    pub port_name: Option<String>,
    #[serde(rename = "PrinterStatus", default)]
    pub printer_status: Option<u16>,
    #[serde(rename = "WorkOffline", default)]
    pub work_offline: Option<bool>,
}

impl PrinterRecord {
    /// Online and idle-or-printing.
    pub fn is_ready(&self) -> bool {
        !self.work_offline.unwrap_or(false)
            && matches!(
                self.printer_status,
                Some(PRINTER_STATUS_IDLE) | Some(PRINTER_STATUS_PRINTING)
            )
    }
}

/// A ready printer as returned to HTTP clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterDescriptor {
    pub name: String,
    /// Opaque connection descriptor (port, USB id, IP...).
    pub port: String,
}

impl From<PrinterRecord> for PrinterDescriptor {
    fn from(record: PrinterRecord) -> Self {
        Self {
            name: record.name,
            port: record.port_name.unwrap_or_default(),
        }
    }
}

/// Rank of a mechanism in the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Primary,
    Fallback,
    LastResort,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Fallback => f.write_str("fallback"),
            Self::LastResort => f.write_str("last-resort"),
        }
    }
}

/// What a single mechanism attempt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierOutcome {
    Success,
    /// The mechanism's tool is not installed; nothing was invoked.
    ToolNotFound(String),
    /// The tool ran and failed, timed out, or could not be spawned.
    MechanismFailed(String),
}

impl TierOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Convert into the error taxonomy, naming the mechanism that produced it.
    pub fn into_result(self, mechanism: &str) -> Result<()> {
        match self {
            Self::Success => Ok(()),
            Self::ToolNotFound(detail) => Err(PrintgateError::PrinterToolNotFound(detail)),
            Self::MechanismFailed(detail) => Err(PrintgateError::PrintMechanismFailed {
                tier: mechanism.to_owned(),
                detail,
            }),
        }
    }
}

impl std::fmt::Display for TierOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::ToolNotFound(detail) => write!(f, "tool not found: {detail}"),
            Self::MechanismFailed(detail) => write!(f, "failed: {detail}"),
        }
    }
}

/// One entry in a dispatch trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierAttempt {
    pub tier: Tier,
    pub mechanism: &'static str,
    pub outcome: TierOutcome,
}

/// Everything a dispatch did, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub attempts: Vec<TierAttempt>,
}

impl DispatchReport {
    /// The tier whose mechanism reported success, if any.
    pub fn completed_by(&self) -> Option<Tier> {
        self.attempts
            .iter()
            .find(|a| a.outcome.is_success())
            .map(|a| a.tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased_with_dot() {
        assert_eq!(extension_of("Label.PDF"), ".pdf");
        assert_eq!(extension_of("notes.txt"), ".txt");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("README"), "");
        assert_eq!(extension_of(".pdf"), "");
    }

    #[test]
    fn file_type_from_extension() {
        assert_eq!(FileType::from_extension(".PDF"), Some(FileType::Pdf));
        assert_eq!(FileType::from_extension(".txt"), Some(FileType::Text));
        assert_eq!(FileType::from_extension(".docx"), None);
    }

    #[test]
    fn print_job_hashes_payload() {
        let job = PrintJob::new("a.txt", PathBuf::from("/tmp/a.txt"), FileType::Text, b"abc");
        assert_eq!(
            job.document_hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(job.size_bytes, 3);
    }

    #[test]
    fn ready_requires_online_and_ready_status() {
        let record = |status, offline| PrinterRecord {
            name: "P".into(),
            port_name: None,
            printer_status: status,
            work_offline: offline,
        };
        assert!(record(Some(3), Some(false)).is_ready());
        assert!(record(Some(4), None).is_ready());
        assert!(!record(Some(4), Some(true)).is_ready());
        assert!(!record(Some(7), Some(false)).is_ready());
        assert!(!record(None, Some(false)).is_ready());
    }

    #[test]
    fn printer_record_parses_cim_json() {
        let json = r#"{"Name":"PT-950NW","PortName":"USB001","PrinterStatus":3,"WorkOffline":false}"#;
        let record: PrinterRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.name, "PT-950NW");
        let descriptor = PrinterDescriptor::from(record);
        assert_eq!(descriptor.port, "USB001");
    }

    #[test]
    fn tier_outcome_maps_onto_error_taxonomy() {
        assert!(TierOutcome::Success.into_result("x").is_ok());
        assert!(matches!(
            TierOutcome::ToolNotFound("none".into()).into_result("sumatra"),
            Err(PrintgateError::PrinterToolNotFound(_))
        ));
        match TierOutcome::MechanismFailed("exit 1".into()).into_result("out-printer") {
            Err(PrintgateError::PrintMechanismFailed { tier, detail }) => {
                assert_eq!(tier, "out-printer");
                assert_eq!(detail, "exit 1");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn report_tracks_completing_tier() {
        let report = DispatchReport {
            attempts: vec![
                TierAttempt {
                    tier: Tier::Primary,
                    mechanism: "out-printer",
                    outcome: TierOutcome::MechanismFailed("exit 1".into()),
                },
                TierAttempt {
                    tier: Tier::Fallback,
                    mechanism: "shell-print-to",
                    outcome: TierOutcome::Success,
                },
            ],
        };
        assert_eq!(report.completed_by(), Some(Tier::Fallback));
        assert!(report.attempts.iter().all(|a| a.tier != Tier::LastResort));
    }
}
