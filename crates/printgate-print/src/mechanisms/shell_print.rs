// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fallback tier: the shell's "PrintTo" verb, addressed to the current printer.
//
// `Start-Process -Verb PrintTo` goes through ShellExecute, so whichever
// application is registered for the file type does the printing.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use printgate_core::types::TierOutcome;

use super::{PrintMechanism, powershell, ps_quote, run_with_timeout};

/// Hands the file to its registered application's print verb.
#[derive(Debug, Clone)]
pub struct ShellPrintToMechanism {
    timeout: Duration,
}

impl ShellPrintToMechanism {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub(crate) fn script(path: &Path, printer: &str) -> String {
        let argument = quote_windows_arg(printer);
        format!(
            "Start-Process -FilePath {} -Verb PrintTo -ArgumentList {} -WindowStyle Hidden",
            ps_quote(&path.to_string_lossy()),
            ps_quote(&argument)
        )
    }
}

/// Quote `value` as one Windows command-line argument.
///
/// Embedded `"` are backslash-escaped, and backslashes are doubled only where
/// they precede a quote, so `\\server\printer` passes through unchanged.
fn quote_windows_arg(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    let mut backslashes = 0usize;
    for c in value.chars() {
        if c == '\\' {
            backslashes += 1;
            continue;
        }
        let escapes = if c == '"' { backslashes * 2 + 1 } else { backslashes };
        quoted.extend(std::iter::repeat_n('\\', escapes));
        quoted.push(c);
        backslashes = 0;
    }
    quoted.extend(std::iter::repeat_n('\\', backslashes * 2));
    quoted.push('"');
    quoted
}

#[async_trait]
impl PrintMechanism for ShellPrintToMechanism {
    fn name(&self) -> &'static str {
        "shell-print-to"
    }

    async fn attempt(&self, path: &Path, printer: &str) -> TierOutcome {
        info!(printer, path = %path.display(), "sending file through the shell PrintTo verb");
        run_with_timeout(powershell(&Self::script(path, printer)), self.timeout).await
    }
}
