// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print mechanisms — one implementation per dispatch tier.
//
// Each mechanism takes a persisted file and a printer name and reports a
// `TierOutcome`. The dispatcher only sees the trait, so a platform can swap
// in its own mechanism set without touching the tier ordering.

mod open_file;
mod out_printer;
mod shell_print;
mod sumatra;

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use printgate_core::types::TierOutcome;

pub use open_file::OpenFileMechanism;
pub use out_printer::OutPrinterMechanism;
pub use shell_print::ShellPrintToMechanism;
pub use sumatra::SumatraMechanism;

/// A way of getting a file onto a printer.
#[async_trait]
pub trait PrintMechanism: Send + Sync {
    /// Short name used in logs and dispatch reports.
    fn name(&self) -> &'static str;

    /// Try once. Must not panic and must respect its own timeout.
    async fn attempt(&self, path: &Path, printer: &str) -> TierOutcome;
}

/// Run `command` to completion or until `timeout` elapses.
///
/// Zero exit is success. Non-zero exit, spawn failure and timeout all count
/// as `MechanismFailed`, carrying whatever diagnostics the process wrote.
pub(crate) async fn run_with_timeout(mut command: Command, timeout: Duration) -> TierOutcome {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = match command.spawn() {
        Ok(child) => child,
        Err(e) => return TierOutcome::MechanismFailed(format!("spawn: {e}")),
    };

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return TierOutcome::MechanismFailed(format!("wait: {e}")),
        Err(_) => {
            return TierOutcome::MechanismFailed(format!(
                "timed out after {}s",
                timeout.as_secs_f32()
            ));
        }
    };

    if output.status.success() {
        debug!(status = %output.status, "command succeeded");
        return TierOutcome::Success;
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let diagnostic = if stderr.trim().is_empty() {
        stdout.trim().to_owned()
    } else {
        stderr.trim().to_owned()
    };
    TierOutcome::MechanismFailed(format!("{}: {diagnostic}", output.status))
}

/// Quote `value` as a single-quoted PowerShell literal.
pub(crate) fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// A `powershell` invocation that runs `script` non-interactively.
pub(crate) fn powershell(script: &str) -> Command {
    let mut command = Command::new("powershell");
    command.args(["-NoProfile", "-NonInteractive", "-Command", script]);
    command
}
