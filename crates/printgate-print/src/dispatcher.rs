// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tiered print dispatch.
//
// A job walks an ordered tier list: the primary mechanism for its file type,
// then the shell print verb, then opening the file. The walk only moves
// forward and stops at the first success. The last-resort tier is terminal
// whatever it reports, so dispatch always finishes and never returns an
// error; the `DispatchReport` says what actually happened.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use printgate_core::config::AppConfig;
use printgate_core::types::{
    DispatchReport, FileType, PrintJob, Tier, TierAttempt, TierOutcome,
};

use crate::mechanisms::{
    OpenFileMechanism, OutPrinterMechanism, PrintMechanism, ShellPrintToMechanism,
    SumatraMechanism,
};

/// Selects and runs print mechanisms for a job.
#[derive(Clone)]
pub struct PrintDispatcher {
    text_primary: Arc<dyn PrintMechanism>,
    pdf_primary: Arc<dyn PrintMechanism>,
    fallback: Arc<dyn PrintMechanism>,
    last_resort: Arc<dyn PrintMechanism>,
}

impl PrintDispatcher {
    pub fn new(
        text_primary: Arc<dyn PrintMechanism>,
        pdf_primary: Arc<dyn PrintMechanism>,
        fallback: Arc<dyn PrintMechanism>,
        last_resort: Arc<dyn PrintMechanism>,
    ) -> Self {
        Self {
            text_primary,
            pdf_primary,
            fallback,
            last_resort,
        }
    }

    /// The Windows mechanism set: Out-Printer / SumatraPDF, PrintTo, open.
    pub fn windows(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(OutPrinterMechanism::new(config.text_print_timeout())),
            Arc::new(SumatraMechanism::new(
                config.expanded_viewer_paths(),
                config.pdf_print_timeout(),
            )),
            Arc::new(ShellPrintToMechanism::new(config.shell_print_timeout())),
            Arc::new(OpenFileMechanism),
        )
    }

    /// Tiers for `file_type`, in the order they are tried.
    pub fn tiers(&self, file_type: FileType) -> [(Tier, &Arc<dyn PrintMechanism>); 3] {
        let primary = match file_type {
            FileType::Text => &self.text_primary,
            FileType::Pdf => &self.pdf_primary,
        };
        [
            (Tier::Primary, primary),
            (Tier::Fallback, &self.fallback),
            (Tier::LastResort, &self.last_resort),
        ]
    }

    /// Dispatch a persisted job to `printer`.
    pub async fn dispatch(&self, job: &PrintJob, printer: &str) -> DispatchReport {
        info!(
            job_id = %job.id,
            file = %job.source_filename,
            file_type = %job.file_type,
            sha256 = %job.document_hash,
            bytes = job.size_bytes,
            printer,
            "dispatching print job"
        );
        self.run_tiers(&job.temp_path, job.file_type, printer).await
    }

    /// Walk the tiers for `path` without a `PrintJob` wrapper.
    pub async fn run_tiers(&self, path: &Path, file_type: FileType, printer: &str) -> DispatchReport {
        let mut report = DispatchReport::default();

        for (tier, mechanism) in self.tiers(file_type) {
            let outcome = mechanism.attempt(path, printer).await;
            let name = mechanism.name();

            match &outcome {
                TierOutcome::Success => {
                    info!(%tier, mechanism = name, "tier succeeded");
                }
                failure => {
                    if let Err(e) = failure.clone().into_result(name) {
                        warn!(%tier, mechanism = name, error = %e, "tier failed");
                    }
                }
            }

            let done = outcome.is_success() || tier == Tier::LastResort;
            report.attempts.push(TierAttempt {
                tier,
                mechanism: name,
                outcome,
            });
            if done {
                break;
            }
            info!(from = %tier, "moving to next tier");
        }

        match report.completed_by() {
            Some(tier) => info!(%tier, "dispatch done"),
            None => warn!("dispatch done, every tier failed"),
        }
        report
    }
}
