// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF primary tier: SumatraPDF silent print.
//
// Only the first candidate that exists on disk is invoked. If it fails the
// tier fails; later candidates are not tried.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, warn};

use printgate_core::types::TierOutcome;

use super::{PrintMechanism, run_with_timeout};

/// Renders a PDF with SumatraPDF's `-print-to <printer> -silent`.
#[derive(Debug, Clone)]
pub struct SumatraMechanism {
    candidates: Vec<PathBuf>,
    timeout: Duration,
}

impl SumatraMechanism {
    pub fn new(candidates: Vec<PathBuf>, timeout: Duration) -> Self {
        Self {
            candidates,
            timeout,
        }
    }

    /// First candidate that exists, in configured order.
    pub async fn locate(&self) -> Option<&Path> {
        for candidate in &self.candidates {
            if tokio::fs::try_exists(candidate).await.unwrap_or(false) {
                return Some(candidate.as_path());
            }
        }
        None
    }
}

#[async_trait]
impl PrintMechanism for SumatraMechanism {
    fn name(&self) -> &'static str {
        "sumatra-pdf"
    }

    async fn attempt(&self, path: &Path, printer: &str) -> TierOutcome {
        let Some(exe) = self.locate().await else {
            warn!(candidates = self.candidates.len(), "SumatraPDF not found in any known location");
            return TierOutcome::ToolNotFound(
                "SumatraPDF no encontrado en las rutas habituales".into(),
            );
        };

        info!(exe = %exe.display(), printer, "printing PDF with SumatraPDF");
        let mut command = Command::new(exe);
        command
            .arg("-print-to")
            .arg(printer)
            .arg("-silent")
            .arg(path);
        run_with_timeout(command, self.timeout).await
    }
}
