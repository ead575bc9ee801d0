// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The process-wide "current printer".
//
// Reads are served from memory. Writes are serialised behind a mutex and
// written through to a single-line file via write-to-temp-then-rename, so a
// reader of the file never sees a torn name. A failed write leaves the
// in-memory value updated: the running process keeps working even when the
// store is read-only.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use tempfile::NamedTempFile;
use tracing::{info, warn};

use printgate_core::error::Result;

/// Current-printer state, constructed once at start-up and shared by handlers.
#[derive(Debug)]
pub struct PrinterRegistry {
    current: RwLock<String>,
    store_path: PathBuf,
    /// Serialises update-then-persist sequences.
    write_lock: Mutex<()>,
}

impl PrinterRegistry {
    /// Seed from `store_path`, falling back to `default_name` when the store
    /// is missing, unreadable, or blank.
    pub fn load(store_path: impl Into<PathBuf>, default_name: &str) -> Self {
        let store_path = store_path.into();
        let name = match std::fs::read_to_string(&store_path) {
            Ok(contents) if !contents.trim().is_empty() => {
                let name = contents.trim().to_owned();
                info!(printer = %name, path = %store_path.display(), "printer loaded from store");
                name
            }
            Ok(_) => {
                warn!(path = %store_path.display(), default = default_name, "printer store is empty, using default");
                default_name.to_owned()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %store_path.display(), default = default_name, "no printer store, using default");
                default_name.to_owned()
            }
            Err(e) => {
                warn!(path = %store_path.display(), error = %e, default = default_name, "printer store unreadable, using default");
                default_name.to_owned()
            }
        };

        Self {
            current: RwLock::new(name),
            store_path,
            write_lock: Mutex::new(()),
        }
    }

    /// Name of the printer every tier targets.
    pub fn current(&self) -> String {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Switch the current printer and persist it.
    ///
    /// Blank names are ignored so the current printer is never empty.
    pub fn set_current(&self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            warn!("ignoring attempt to set an empty printer name");
            return;
        }

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = name.to_owned();

        match write_atomically(&self.store_path, name) {
            Ok(()) => info!(printer = name, "printer saved for future sessions"),
            Err(e) => warn!(
                printer = name,
                path = %self.store_path.display(),
                error = %e,
                "could not persist printer, keeping in-memory value"
            ),
        }
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }
}

fn write_atomically(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
