// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printgate Print — everything that touches the host's print facilities: the
// persisted current-printer registry, OS printer discovery, the temp-file
// lifecycle around a job, and the tiered dispatch state machine.

pub mod discovery;
pub mod dispatcher;
pub mod mechanisms;
pub mod registry;
pub mod temp_files;

pub use discovery::{PowerShellPrinterBackend, PrinterBackend, PrinterDiscovery};
pub use dispatcher::PrintDispatcher;
pub use mechanisms::PrintMechanism;
pub use registry::PrinterRegistry;
pub use temp_files::TempFileManager;
