// download.rs - Saving compressed payloads, one at a time or staggered in bulk

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::NamedTempFile;
use tokio::time::{sleep_until, Instant};

use crate::config::DOWNLOAD_STAGGER;
use crate::error::{Error, Result};
use crate::ledger::CompressionResult;

const PREFIX: &str = "compressed_";

/// `photo.png` becomes `compressed_photo.png`. Only the part after the last
/// dot counts as the extension.
pub fn download_filename(source_name: &str) -> String {
    match source_name.rsplit_once('.') {
        Some((base, ext)) => format!("{PREFIX}{base}.{ext}"),
        None => format!("{PREFIX}{source_name}"),
    }
}

/// Name of the `copy`-th file saved under `filename`: `compressed_x.png`,
/// then `compressed_x (1).png`, `compressed_x (2).png`, ...
fn numbered_name(filename: &str, copy: u32) -> String {
    if copy == 0 {
        return filename.to_string();
    }
    match filename.rsplit_once('.') {
        Some((base, ext)) => format!("{base} ({copy}).{ext}"),
        None => format!("{filename} ({copy})"),
    }
}

/// Where saved files end up.
pub trait DownloadSink: Send + Sync {
    fn save(&self, filename: &str, payload: &[u8]) -> Result<PathBuf>;
}

/// Writes files into a directory, creating it on first use. Existing files
/// are never replaced; a taken name gets a ` (n)` suffix instead.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DownloadSink for DirectorySink {
    fn save(&self, filename: &str, payload: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))?;
        // The temporary file is removed on drop if anything below fails.
        let mut staged = NamedTempFile::new_in(&self.dir).map_err(|e| Error::io(&self.dir, e))?;
        staged
            .write_all(payload)
            .map_err(|e| Error::io(staged.path(), e))?;
        let mut copy = 0;
        loop {
            let target = self.dir.join(numbered_name(filename, copy));
            match staged.persist_noclobber(&target) {
                Ok(_) => return Ok(target),
                Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                    staged = e.file;
                    copy += 1;
                }
                Err(e) => return Err(Error::io(&target, e.error)),
            }
        }
    }
}

/// Outcome of one save in a bulk download.
#[derive(Debug)]
pub struct DownloadReport {
    pub filename: String,
    pub outcome: Result<PathBuf>,
}

impl DownloadReport {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[derive(Clone)]
pub struct DownloadDispatcher {
    sink: Arc<dyn DownloadSink>,
    stagger: Duration,
}

impl DownloadDispatcher {
    pub fn new(sink: Arc<dyn DownloadSink>) -> Self {
        Self::with_stagger(sink, DOWNLOAD_STAGGER)
    }

    pub fn with_stagger(sink: Arc<dyn DownloadSink>, stagger: Duration) -> Self {
        Self { sink, stagger }
    }

    pub fn download_one(&self, result: &CompressionResult) -> Result<PathBuf> {
        let filename = download_filename(&result.source_name);
        let saved = self.sink.save(&filename, &result.payload)?;
        log::info!("saved {}", saved.display());
        Ok(saved)
    }

    /// Builds the staggered save schedule for `results`.
    ///
    /// The i-th save starts no earlier than `i * stagger` after this call and
    /// runs on the blocking pool. The returned future owns everything it
    /// needs; nothing cancels it once it has been spawned.
    pub fn schedule_all(
        &self,
        results: Vec<CompressionResult>,
    ) -> Result<impl std::future::Future<Output = Vec<DownloadReport>> + Send + 'static> {
        if results.is_empty() {
            return Err(Error::NothingToDownload);
        }
        let start = Instant::now();
        let this = self.clone();
        log::info!("scheduling {} downloads", results.len());

        Ok(async move {
            let mut reports = Vec::with_capacity(results.len());
            for (index, result) in results.into_iter().enumerate() {
                sleep_until(start + this.stagger * index as u32).await;
                let filename = download_filename(&result.source_name);
                let worker = this.clone();
                let outcome = tokio::task::spawn_blocking(move || worker.download_one(&result))
                    .await
                    .unwrap_or_else(|e| Err(Error::io(&filename, io::Error::new(io::ErrorKind::Other, e))));
                if let Err(e) = &outcome {
                    log::error!("download of {filename} failed: {e}");
                }
                reports.push(DownloadReport { filename, outcome });
            }
            reports
        })
    }
}
