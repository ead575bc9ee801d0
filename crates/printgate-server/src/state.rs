// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared handler state, built once at start-up and handed to actix as
// `web::Data<AppState>`.

use std::sync::Arc;

use tracing::{info, warn};

use printgate_core::AppConfig;
use printgate_core::validation::RequestValidator;
use printgate_print::{
    PowerShellPrinterBackend, PrintDispatcher, PrinterDiscovery, PrinterRegistry,
    TempFileManager,
};

/// Services every route may need.
pub struct AppState {
    pub registry: PrinterRegistry,
    pub discovery: PrinterDiscovery,
    pub dispatcher: PrintDispatcher,
    pub temp_files: TempFileManager,
    pub validator: RequestValidator,
}

impl AppState {
    pub fn new(
        registry: PrinterRegistry,
        discovery: PrinterDiscovery,
        dispatcher: PrintDispatcher,
        temp_files: TempFileManager,
        validator: RequestValidator,
    ) -> Self {
        Self {
            registry,
            discovery,
            dispatcher,
            temp_files,
            validator,
        }
    }

    /// Production wiring for a Windows host.
    pub fn from_config(config: &AppConfig) -> Self {
        let validator = RequestValidator::from_config(config);
        if let Err(e) = validator.validate_platform() {
            warn!(error = %e, host_os = std::env::consts::OS, "print requests will be rejected on this host");
        }

        let registry = PrinterRegistry::load(&config.printer_store_path, &config.default_printer);
        let temp_files = TempFileManager::new(
            config.temp_dir(),
            config.temp_file_prefix.clone(),
            config.cleanup_delay(),
        );
        info!(
            temp_dir = %temp_files.dir().display(),
            cleanup_delay_secs = config.cleanup_delay_secs,
            "app state initialised"
        );

        Self::new(
            registry,
            PrinterDiscovery::new(Arc::new(PowerShellPrinterBackend::default())),
            PrintDispatcher::windows(config),
            temp_files,
            validator,
        )
    }
}
