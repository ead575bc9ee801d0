// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Installed-printer discovery and default-printer selection.
//
// The OS is reached through a `PrinterBackend`. The production backend asks
// CIM (`Win32_Printer`) through PowerShell and reads the result as JSON.
//
// Listing is forgiving: a failed query is logged and treated as "no printers".
// Setting the default is not: the caller must be able to tell "no such
// printer" (`Ok(false)`) from "the OS refused" (`Err`).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use printgate_core::error::{PrintgateError, Result};
use printgate_core::types::{PrinterDescriptor, PrinterRecord};

use crate::mechanisms::{powershell, ps_quote};

/// Default timeout for a CIM query.
const QUERY_TIMEOUT: Duration = Duration::from_secs(15);

/// Exit code the set-default script uses for "no printer with that name".
const EXIT_NOT_FOUND: i32 = 2;

/// Access to the host's printer subsystem.
#[async_trait]
pub trait PrinterBackend: Send + Sync {
    /// Every installed printer, unfiltered.
    async fn list_printers(&self) -> Result<Vec<PrinterRecord>>;

    /// Make `name` the OS default printer.
    async fn set_default(&self, name: &str) -> Result<()>;
}

/// Discovery service over a backend.
#[derive(Clone)]
pub struct PrinterDiscovery {
    backend: Arc<dyn PrinterBackend>,
}

impl PrinterDiscovery {
    pub fn new(backend: Arc<dyn PrinterBackend>) -> Self {
        Self { backend }
    }

    /// Printers that are online and idle or printing.
    ///
    /// Never fails: a query error yields an empty list and a warning.
    pub async fn list_ready(&self) -> Vec<PrinterDescriptor> {
        info!("scanning for ready printers");
        let records = match self.backend.list_printers().await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "printer query failed, reporting no printers");
                return Vec::new();
            }
        };

        let total = records.len();
        let ready: Vec<PrinterDescriptor> = records
            .into_iter()
            .filter(PrinterRecord::is_ready)
            .map(PrinterDescriptor::from)
            .collect();

        for printer in &ready {
            debug!(name = %printer.name, port = %printer.port, "ready printer found");
        }
        if ready.is_empty() {
            warn!(total, "no printers in an idle or printing state");
        } else {
            info!(ready = ready.len(), total, "printer scan complete");
        }
        ready
    }

    /// Make `name` the OS default printer.
    ///
    /// Returns `Ok(false)` when no installed printer has exactly that name.
    pub async fn set_as_default(&self, name: &str) -> Result<bool> {
        info!(printer = name, "setting default printer");
        let records = self
            .backend
            .list_printers()
            .await
            .map_err(|e| PrintgateError::PrinterOperationFailed(e.to_string()))?;

        if !records.iter().any(|r| r.name == name) {
            warn!(printer = name, "no installed printer with that name");
            return Ok(false);
        }

        self.backend.set_default(name).await.map_err(|e| match e {
            PrintgateError::PrinterOperationFailed(_) => e,
            other => PrintgateError::PrinterOperationFailed(other.to_string()),
        })?;
        info!(printer = name, "default printer updated");
        Ok(true)
    }
}

/// CIM-over-PowerShell backend for Windows hosts.
#[derive(Debug, Clone)]
pub struct PowerShellPrinterBackend {
    timeout: Duration,
}

impl Default for PowerShellPrinterBackend {
    fn default() -> Self {
        Self {
            timeout: QUERY_TIMEOUT,
        }
    }
}

impl PowerShellPrinterBackend {
    async fn run(&self, script: &str) -> Result<std::process::Output> {
        let mut command = powershell(script);
        command.kill_on_drop(true);
        tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                PrintgateError::PrinterOperationFailed(format!(
                    "printer query timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| PrintgateError::PrinterOperationFailed(format!("powershell: {e}")))
    }
}

#[async_trait]
impl PrinterBackend for PowerShellPrinterBackend {
    async fn list_printers(&self) -> Result<Vec<PrinterRecord>> {
        let output = self
            .run(
                "Get-CimInstance -ClassName Win32_Printer | \
                 Select-Object Name, PortName, PrinterStatus, WorkOffline | \
                 ConvertTo-Json -Compress",
            )
            .await?;
        if !output.status.success() {
            return Err(PrintgateError::PrinterOperationFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            ));
        }
        parse_printer_json(&String::from_utf8_lossy(&output.stdout))
    }

    async fn set_default(&self, name: &str) -> Result<()> {
        let script = format!(
            "$n = {}; \
             $p = Get-CimInstance -ClassName Win32_Printer | Where-Object {{ $_.Name -eq $n }}; \
             if (-not $p) {{ exit {EXIT_NOT_FOUND} }}; \
             $r = Invoke-CimMethod -InputObject $p -MethodName SetDefaultPrinter; \
             if ($r.ReturnValue -ne 0) {{ Write-Error \"SetDefaultPrinter returned $($r.ReturnValue)\"; exit 1 }}",
            ps_quote(name)
        );
        let output = self.run(&script).await?;
        match output.status.code() {
            Some(0) => Ok(()),
            Some(EXIT_NOT_FOUND) => Err(PrintgateError::PrinterOperationFailed(format!(
                "printer '{name}' disappeared before it could be set as default"
            ))),
            _ => Err(PrintgateError::PrinterOperationFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            )),
        }
    }
}

/// Parse `ConvertTo-Json` output, which is an array, a lone object, or empty.
pub fn parse_printer_json(raw: &str) -> Result<Vec<PrinterRecord>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    if raw.starts_with('[') {
        Ok(serde_json::from_str(raw)?)
    } else {
        Ok(vec![serde_json::from_str(raw)?])
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// In-memory backend recording `set_default` calls.
    #[derive(Default)]
    struct FakeBackend {
        printers: Vec<PrinterRecord>,
        fail_list: bool,
        fail_set: bool,
        defaults_set: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PrinterBackend for FakeBackend {
        async fn list_printers(&self) -> Result<Vec<PrinterRecord>> {
            if self.fail_list {
                return Err(PrintgateError::PrinterOperationFailed("CIM unavailable".into()));
            }
            Ok(self.printers.clone())
        }

        async fn set_default(&self, name: &str) -> Result<()> {
            if self.fail_set {
                return Err(PrintgateError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "access denied",
                )));
            }
            self.defaults_set.lock().unwrap().push(name.to_owned());
            Ok(())
        }
    }

    fn record(name: &str, status: Option<u16>, offline: Option<bool>) -> PrinterRecord {
        PrinterRecord {
            name: name.into(),
            port_name: Some(format!("{name}-port")),
            printer_status: status,
            work_offline: offline,
        }
    }

    fn discovery(backend: FakeBackend) -> (PrinterDiscovery, Arc<FakeBackend>) {
        let backend = Arc::new(backend);
        (PrinterDiscovery::new(backend.clone()), backend)
    }

    #[tokio::test]
    async fn list_ready_keeps_online_idle_or_printing_only() {
        let (discovery, _) = discovery(FakeBackend {
            printers: vec![
                record("idle", Some(3), Some(false)),
                record("printing", Some(4), None),
                record("offline-idle", Some(3), Some(true)),
                record("error", Some(7), Some(false)),
                record("unknown", Some(2), Some(false)),
                record("no-status", None, Some(false)),
            ],
            ..Default::default()
        });

        let mut names: Vec<_> = discovery
            .list_ready()
            .await
            .into_iter()
            .map(|p| p.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["idle", "printing"]);
    }

    #[tokio::test]
    async fn list_ready_carries_port() {
        let (discovery, _) = discovery(FakeBackend {
            printers: vec![record("PT-950NW", Some(3), Some(false))],
            ..Default::default()
        });
        let ready = discovery.list_ready().await;
        assert_eq!(ready[0].port, "PT-950NW-port");
    }

    #[tokio::test]
    async fn list_ready_absorbs_query_failure() {
        let (discovery, _) = discovery(FakeBackend {
            fail_list: true,
            ..Default::default()
        });
        assert!(discovery.list_ready().await.is_empty());
    }

    #[tokio::test]
    async fn set_as_default_unknown_name_is_false() {
        let (discovery, backend) = discovery(FakeBackend {
            printers: vec![record("PT-950NW", Some(3), Some(false))],
            ..Default::default()
        });
        assert!(!discovery.set_as_default("Ghost Printer").await.unwrap());
        assert!(backend.defaults_set.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_as_default_requires_exact_name() {
        let (discovery, _) = discovery(FakeBackend {
            printers: vec![record("PT-950NW", Some(3), Some(false))],
            ..Default::default()
        });
        assert!(!discovery.set_as_default("pt-950nw").await.unwrap());
    }

    #[tokio::test]
    async fn set_as_default_found_calls_backend() {
        let (discovery, backend) = discovery(FakeBackend {
            // Readiness does not matter for selection.
            printers: vec![record("Office Laser", Some(7), Some(true))],
            ..Default::default()
        });
        assert!(discovery.set_as_default("Office Laser").await.unwrap());
        assert_eq!(*backend.defaults_set.lock().unwrap(), vec!["Office Laser"]);
    }

    #[tokio::test]
    async fn set_as_default_propagates_os_refusal() {
        let (discovery, _) = discovery(FakeBackend {
            printers: vec![record("PT-950NW", Some(3), Some(false))],
            fail_set: true,
            ..Default::default()
        });
        assert!(matches!(
            discovery.set_as_default("PT-950NW").await,
            Err(PrintgateError::PrinterOperationFailed(msg)) if msg.contains("access denied")
        ));
    }

    #[tokio::test]
    async fn set_as_default_propagates_query_failure() {
        let (discovery, _) = discovery(FakeBackend {
            fail_list: true,
            ..Default::default()
        });
        assert!(matches!(
            discovery.set_as_default("PT-950NW").await,
            Err(PrintgateError::PrinterOperationFailed(_))
        ));
    }

    #[test]
    fn parse_handles_array_single_and_empty() {
        let many = r#"[{"Name":"A","PortName":"USB001","PrinterStatus":3,"WorkOffline":false},
                       {"Name":"B","PortName":null,"PrinterStatus":null,"WorkOffline":true}]"#;
        let parsed = parse_printer_json(many).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].port_name, None);

        let one = r#"{"Name":"A","PortName":"LPT1:","PrinterStatus":4,"WorkOffline":false}"#;
        assert_eq!(parse_printer_json(one).unwrap()[0].port_name.as_deref(), Some("LPT1:"));

        assert!(parse_printer_json("  \r\n").unwrap().is_empty());
        assert!(parse_printer_json("not json").is_err());
    }
}
