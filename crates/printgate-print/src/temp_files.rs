// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Temp-file lifecycle around a print job.
//
// Payloads are written to uniquely named files (UUIDv4, 122 random bits) that
// keep the upload's extension, since the shell and viewer tiers pick their
// handler by extension. Deletion happens in a detached task after a grace
// period because those tiers may still be reading the file when dispatch
// returns.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use printgate_core::error::Result;
use printgate_core::types::extension_of;

/// A scheduled deletion that has not been reaped yet.
struct PendingCleanup {
    path: PathBuf,
    handle: JoinHandle<()>,
}

/// Creates job payload files and schedules their removal.
pub struct TempFileManager {
    dir: PathBuf,
    prefix: String,
    grace: Duration,
    pending: Mutex<Vec<PendingCleanup>>,
}

impl TempFileManager {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, grace: Duration) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            grace,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` to a fresh file named after `filename`'s extension.
    ///
    /// The file is created with `create_new`, so an existing path is never
    /// overwritten.
    pub async fn persist(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.dir.join(format!(
            "{}{}{}",
            self.prefix,
            Uuid::new_v4().simple(),
            extension_of(filename)
        ));

        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        write_or_discard(&path, file, bytes).await?;

        info!(
            original = filename,
            path = %path.display(),
            bytes = bytes.len(),
            "payload saved to temp file"
        );
        Ok(path)
    }

    /// Delete `path` after the grace period, in the background.
    ///
    /// Never blocks and never fails; deletion errors are only logged.
    pub fn schedule_cleanup(&self, path: PathBuf) {
        let grace = self.grace;
        let task_path = path.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            remove_quietly(&task_path);
        });

        let mut pending = self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        pending.retain(|p| !p.handle.is_finished());
        pending.push(PendingCleanup { path, handle });
        debug!(pending = pending.len(), grace_secs = grace.as_secs_f32(), "cleanup scheduled");
    }

    /// Number of scheduled deletions that have not finished.
    pub fn pending(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|p| !p.handle.is_finished())
            .count()
    }

    /// Wait for every scheduled deletion. Used at shutdown.
    ///
    /// Tasks whose runtime has already gone away are cancelled rather than
    /// completed; their files are removed here instead.
    pub async fn drain(&self) {
        let pending = std::mem::take(
            &mut *self
                .pending
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );
        if pending.is_empty() {
            return;
        }

        info!(count = pending.len(), "draining temp file cleanups");
        for PendingCleanup { path, handle } in pending {
            if let Err(e) = handle.await {
                debug!(path = %path.display(), error = %e, "cleanup task did not complete, removing now");
                remove_quietly(&path);
            }
        }
    }
}

/// Write `bytes` through `writer`, removing `path` if the write fails.
///
/// A partially written payload must not outlive the failed request, since no
/// cleanup is ever scheduled for it.
async fn write_or_discard<W>(path: &Path, mut writer: W, bytes: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = match writer.write_all(bytes).await {
        Ok(()) => writer.flush().await,
        Err(e) => Err(e),
    };
    // Close the handle before removing; Windows refuses to delete open files.
    drop(writer);

    if let Err(e) = written {
        warn!(path = %path.display(), error = %e, "payload write failed, discarding partial file");
        if let Err(rm) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %rm, "could not remove partial temp file");
        }
        return Err(e.into());
    }
    Ok(())
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => info!(path = %path.display(), "temp file removed"),
        Err(e) => warn!(path = %path.display(), error = %e, "could not remove temp file"),
    }
}

#[cfg(test)]
mod tests {
    use printgate_core::error::PrintgateError;

    use super::*;

    #[tokio::test]
    async fn persist_creates_new_file_with_identical_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let manager = TempFileManager::new(dir.path(), "etiqueta_", Duration::from_secs(5));

        let payload = b"^XA^FDHello^FS^XZ".to_vec();
        let path = manager.persist("Label.TXT", &payload).await.unwrap();

        assert!(path.starts_with(dir.path()));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("etiqueta_"));
        assert!(name.ends_with(".txt"));
        assert_eq!(std::fs::read(&path).unwrap(), payload);
    }

    #[tokio::test]
    async fn persist_never_reuses_a_path() {
        let dir = tempfile::tempdir().unwrap();
        let manager = TempFileManager::new(dir.path(), "job_", Duration::from_secs(5));

        let mut seen = std::collections::HashSet::new();
        for i in 0..50 {
            let path = manager.persist("a.pdf", &[i]).await.unwrap();
            assert!(seen.insert(path));
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 50);
    }

    /// Accepts a few bytes, then fails like a full disk.
    struct FailingWriter {
        accepted: usize,
    }

    impl AsyncWrite for FailingWriter {
        fn poll_write(
            mut self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            buf: &[u8],
        ) -> std::task::Poll<std::io::Result<usize>> {
            if self.accepted == 0 {
                self.accepted = buf.len().min(8);
                return std::task::Poll::Ready(Ok(self.accepted));
            }
            std::task::Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::StorageFull,
                "no space left on device",
            )))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn failed_write_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("etiqueta_partial.txt");
        std::fs::write(&path, b"^XA^FD").unwrap();

        let result =
            write_or_discard(&path, FailingWriter { accepted: 0 }, &[b'x'; 64 * 1024]).await;

        assert!(matches!(result, Err(PrintgateError::Io(_))));
        assert!(!path.exists(), "partial payload left behind");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn successful_write_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("etiqueta_ok.txt");
        let file = tokio::fs::File::create(&path).await.unwrap();

        write_or_discard(&path, file, b"HELLO").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"HELLO");
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_waits_for_grace_period() {
        let dir = tempfile::tempdir().unwrap();
        let manager = TempFileManager::new(dir.path(), "job_", Duration::from_secs(5));
        let path = dir.path().join("job_scheduled.pdf");
        std::fs::write(&path, b"%PDF").unwrap();

        manager.schedule_cleanup(path.clone());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(path.exists(), "deleted before the grace period");

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert!(!path.exists(), "not deleted after the grace period");
        assert_eq!(manager.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_of_missing_file_is_absorbed() {
        let dir = tempfile::tempdir().unwrap();
        let manager = TempFileManager::new(dir.path(), "job_", Duration::from_millis(10));

        manager.schedule_cleanup(dir.path().join("never-existed.txt"));
        manager.drain().await;
        assert_eq!(manager.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn drain_waits_for_outstanding_deletions() {
        let dir = tempfile::tempdir().unwrap();
        let manager = TempFileManager::new(dir.path(), "job_", Duration::from_secs(5));
        let paths: Vec<_> = (0..3)
            .map(|i| {
                let p = dir.path().join(format!("job_{i}.txt"));
                std::fs::write(&p, b"x").unwrap();
                p
            })
            .collect();
        for p in &paths {
            manager.schedule_cleanup(p.clone());
        }

        manager.drain().await;
        assert!(paths.iter().all(|p| !p.exists()));
    }

    #[test]
    fn drain_removes_files_whose_runtime_is_gone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job_orphan.txt");
        std::fs::write(&path, b"x").unwrap();
        let manager = TempFileManager::new(dir.path(), "job_", Duration::from_secs(3600));

        // Schedule on a runtime that is then dropped, cancelling the task.
        {
            let worker = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .unwrap();
            worker.block_on(async { manager.schedule_cleanup(path.clone()) });
        }

        let main = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        main.block_on(manager.drain());
        assert!(!path.exists());
    }
}
