// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Last-resort tier: open the file in its default viewer.
//
// Nothing is printed by this tier itself; it only makes sure the document
// surfaces somewhere on the host. The printer name is ignored.

use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use printgate_core::types::TierOutcome;

use super::PrintMechanism;

/// Opens the file with the OS default handler, without waiting for it.
#[derive(Debug, Clone, Default)]
pub struct OpenFileMechanism;

#[async_trait]
impl PrintMechanism for OpenFileMechanism {
    fn name(&self) -> &'static str {
        "open-default-viewer"
    }

    async fn attempt(&self, path: &Path, _printer: &str) -> TierOutcome {
        info!(path = %path.display(), "last resort: opening file in its default viewer");
        match open::that_detached(path) {
            Ok(()) => TierOutcome::Success,
            Err(e) => TierOutcome::MechanismFailed(format!("open: {e}")),
        }
    }
}
