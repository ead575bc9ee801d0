// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.
//
// Every field has a compiled-in default; an optional JSON file named by
// `PRINTGATE_CONFIG` overrides any subset of them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PrintgateError, Result};

/// Environment variable naming the JSON config file.
pub const CONFIG_ENV_VAR: &str = "PRINTGATE_CONFIG";

/// Printer used when nothing has been persisted yet.
pub const DEFAULT_PRINTER: &str = "Microsoft Print to PDF";

/// Application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address to bind. `None` binds the detected LAN address.
    pub host: Option<String>,
    /// HTTP port.
    pub port: u16,
    /// Printer name used when the persisted store is missing or unreadable.
    pub default_printer: String,
    /// Single-line file holding the current printer name.
    pub printer_store_path: PathBuf,
    /// SumatraPDF install locations, checked in order. `~` expands to home.
    pub viewer_paths: Vec<String>,
    pub text_print_timeout_secs: u64,
    pub pdf_print_timeout_secs: u64,
    /// Timeout for the shell "PrintTo" fallback.
    pub shell_print_timeout_secs: u64,
    /// Grace period before a job's temp file is deleted.
    pub cleanup_delay_secs: u64,
    /// Accepted upload extensions, lowercased with leading dot.
    pub supported_extensions: Vec<String>,
    /// `std::env::consts::OS` value the print tiers are built for.
    pub target_os: String,
    /// Directory for job payloads. `None` uses the system temp dir.
    pub temp_dir: Option<PathBuf>,
    /// Prefix of persisted payload filenames.
    pub temp_file_prefix: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 5000,
            default_printer: DEFAULT_PRINTER.into(),
            printer_store_path: PathBuf::from("impresora_guardada.txt"),
            viewer_paths: vec![
                r"~\AppData\Local\SumatraPDF\SumatraPDF.exe".into(),
                r"C:\Program Files\SumatraPDF\SumatraPDF.exe".into(),
                r"C:\Program Files (x86)\SumatraPDF\SumatraPDF.exe".into(),
            ],
            text_print_timeout_secs: 10,
            pdf_print_timeout_secs: 15,
            shell_print_timeout_secs: 10,
            cleanup_delay_secs: 5,
            supported_extensions: vec![".pdf".into(), ".txt".into()],
            target_os: "windows".into(),
            temp_dir: None,
            temp_file_prefix: "etiqueta_".into(),
        }
    }
}

impl AppConfig {
    /// Load from `PRINTGATE_CONFIG` if set, otherwise use defaults.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load_from(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let config: Self = serde_json::from_str(&data)
            .map_err(|e| PrintgateError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.default_printer.trim().is_empty() {
            return Err(PrintgateError::Config("default_printer is empty".into()));
        }
        if self.supported_extensions.is_empty() {
            return Err(PrintgateError::Config("supported_extensions is empty".into()));
        }
        Ok(())
    }

    pub fn text_print_timeout(&self) -> Duration {
        Duration::from_secs(self.text_print_timeout_secs)
    }

    pub fn pdf_print_timeout(&self) -> Duration {
        Duration::from_secs(self.pdf_print_timeout_secs)
    }

    pub fn shell_print_timeout(&self) -> Duration {
        Duration::from_secs(self.shell_print_timeout_secs)
    }

    pub fn cleanup_delay(&self) -> Duration {
        Duration::from_secs(self.cleanup_delay_secs)
    }

    /// Temp directory for payloads.
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Viewer candidates with `~` expanded, order preserved.
    pub fn expanded_viewer_paths(&self) -> Vec<PathBuf> {
        let home = home_dir();
        self.viewer_paths
            .iter()
            .map(|p| expand_home(p, home.as_deref()))
            .collect()
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(PathBuf::from)
}

fn expand_home(path: &str, home: Option<&Path>) -> PathBuf {
    match (path.strip_prefix('~'), home) {
        (Some(rest), Some(home)) => {
            let rest = rest.trim_start_matches(['/', '\\']);
            // Keep the original separators; Windows accepts either.
            PathBuf::from(format!("{}{}{}", home.display(), std::path::MAIN_SEPARATOR, rest))
        }
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_label_printer_setup() {
        let config = AppConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.text_print_timeout(), Duration::from_secs(10));
        assert_eq!(config.pdf_print_timeout(), Duration::from_secs(15));
        assert_eq!(config.cleanup_delay(), Duration::from_secs(5));
        assert_eq!(config.supported_extensions, vec![".pdf", ".txt"]);
        assert_eq!(config.viewer_paths.len(), 3);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("printgate.json");
        std::fs::write(&path, r#"{"port": 8080, "default_printer": "PT-950NW"}"#).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.default_printer, "PT-950NW");
        assert_eq!(config.cleanup_delay_secs, 5);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.default_printer, DEFAULT_PRINTER);
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(PrintgateError::Config(_))
        ));
    }

    #[test]
    fn empty_default_printer_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(&path, r#"{"default_printer": "  "}"#).unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn tilde_expands_against_home() {
        let home = Path::new("/home/label");
        let expanded = expand_home(r"~\AppData\Local\SumatraPDF\SumatraPDF.exe", Some(home));
        let text = expanded.to_string_lossy();
        assert!(text.starts_with("/home/label"));
        assert!(text.ends_with("SumatraPDF.exe"));
        assert_eq!(
            expand_home(r"C:\Program Files\SumatraPDF\SumatraPDF.exe", Some(home)),
            PathBuf::from(r"C:\Program Files\SumatraPDF\SumatraPDF.exe")
        );
    }
}
