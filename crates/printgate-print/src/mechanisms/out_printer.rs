// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-text primary tier: `Get-Content <file> | Out-Printer -Name <printer>`.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use printgate_core::types::TierOutcome;

use super::{PrintMechanism, powershell, ps_quote, run_with_timeout};

/// Pipes a text file through PowerShell's printer pipe.
#[derive(Debug, Clone)]
pub struct OutPrinterMechanism {
    timeout: Duration,
}

impl OutPrinterMechanism {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub(crate) fn script(path: &Path, printer: &str) -> String {
        format!(
            "Get-Content -LiteralPath {} | Out-Printer -Name {}",
            ps_quote(&path.to_string_lossy()),
            ps_quote(printer)
        )
    }
}

#[async_trait]
impl PrintMechanism for OutPrinterMechanism {
    fn name(&self) -> &'static str {
        "out-printer"
    }

    async fn attempt(&self, path: &Path, printer: &str) -> TierOutcome {
        info!(printer, path = %path.display(), "sending text file through Out-Printer");
        run_with_timeout(powershell(&Self::script(path, printer)), self.timeout).await
    }
}
