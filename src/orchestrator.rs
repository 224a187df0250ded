// orchestrator.rs - Batch, ledger and run state behind the panel's intents

use std::path::PathBuf;
use std::sync::Arc;

use crate::compression::{CompressionOptions, Compressor};
use crate::config::{CompressionConfig, RawSettings};
use crate::download::{DownloadDispatcher, DownloadReport};
use crate::error::{Error, Result};
use crate::intake::{self, SelectedFile};
use crate::ledger::{CompressionFailure, CompressionResult, Ledger, LedgerEntry};
use crate::presenter::{Presenter, Row};

/// One file waiting to be compressed.
#[derive(Debug, Clone)]
pub struct Job {
    pub index: usize,
    pub file: SelectedFile,
    pub options: CompressionOptions,
}

/// Compresses one job. Failures become ledger entries instead of errors.
pub async fn invoke(compressor: Arc<dyn Compressor>, job: Job) -> LedgerEntry {
    let name = job.file.name().to_string();
    log::info!("compressing {name} ({} of batch)", job.index + 1);
    match compressor.compress(&job.file, &job.options).await {
        Ok(payload) => {
            let result = CompressionResult::new(name, job.file.size(), payload);
            log::info!(
                "{}: {} -> {} bytes ({}% smaller)",
                result.source_name,
                result.original_size,
                result.compressed_size,
                result.ratio_percent
            );
            LedgerEntry::Compressed(result)
        }
        Err(e) => {
            log::warn!("error compressing {name}: {e}");
            LedgerEntry::Failed(CompressionFailure {
                source_name: name,
                reason: e.to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    pub compressed: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.compressed + self.failed
    }
}

#[derive(Debug, Clone, Default)]
enum RunState {
    #[default]
    Idle,
    Running {
        files: Vec<SelectedFile>,
        config: CompressionConfig,
        next: usize,
    },
}

/// What the caller should do after recording an entry.
#[derive(Debug, Clone)]
pub enum Step {
    Next(Job),
    Finished(BatchSummary),
}

/// Owns the current batch, the ledger and the run state.
pub struct Orchestrator {
    batch: Vec<SelectedFile>,
    ledger: Ledger,
    state: RunState,
    downloads: DownloadDispatcher,
}

impl Orchestrator {
    pub fn new(downloads: DownloadDispatcher) -> Self {
        Self {
            batch: Vec::new(),
            ledger: Ledger::new(),
            state: RunState::Idle,
            downloads,
        }
    }

    pub fn batch(&self) -> &[SelectedFile] {
        &self.batch
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, RunState::Running { .. })
    }

    /// `(done, total)` of the current run.
    pub fn progress(&self) -> Option<(usize, usize)> {
        match &self.state {
            RunState::Running { files, next, .. } => Some((*next, files.len())),
            RunState::Idle => None,
        }
    }

    pub fn set_downloads(&mut self, downloads: DownloadDispatcher) {
        self.downloads = downloads;
    }

    /// Replaces the batch with the images among `files`.
    ///
    /// A run in progress keeps working on the files it started with.
    pub fn select(&mut self, files: Vec<SelectedFile>) -> Result<usize> {
        let images = intake::filter_images(files)?;
        log::info!("{} image(s) selected", images.len());
        self.batch = images;
        Ok(self.batch.len())
    }

    /// Clears the ledger and hands out the first job of a new run.
    pub fn start(&mut self, settings: &RawSettings) -> Result<Job> {
        if self.is_running() {
            return Err(Error::Busy);
        }
        if self.batch.is_empty() {
            return Err(Error::EmptyBatch);
        }
        let config = settings.to_config()?;
        self.ledger.clear();
        let files = self.batch.clone();
        let first = Job {
            index: 0,
            file: files[0].clone(),
            options: CompressionOptions::from(&config),
        };
        log::info!("starting run over {} file(s), {config:?}", files.len());
        self.state = RunState::Running {
            files,
            config,
            next: 0,
        };
        Ok(first)
    }

    /// Records the outcome of the current job and moves on.
    pub fn complete(&mut self, entry: LedgerEntry) -> Step {
        let next_job = match &mut self.state {
            RunState::Idle => {
                log::warn!("dropping result for {} outside a run", entry.source_name());
                return Step::Finished(self.summary());
            }
            RunState::Running { files, config, next } => {
                self.ledger.push(entry);
                *next += 1;
                files.get(*next).map(|file| Job {
                    index: *next,
                    file: file.clone(),
                    options: CompressionOptions::from(&*config),
                })
            }
        };
        match next_job {
            Some(job) => Step::Next(job),
            None => {
                self.state = RunState::Idle;
                let summary = self.summary();
                log::info!(
                    "run finished: {} compressed, {} failed",
                    summary.compressed,
                    summary.failed
                );
                Step::Finished(summary)
            }
        }
    }

    /// Shows `entry` on `presenter`, then records it like [`Self::complete`].
    pub fn record(&mut self, entry: LedgerEntry, presenter: &mut dyn Presenter) -> Step {
        if let Some((done, _)) = self.progress() {
            presenter.push_row(done, Row::from(&entry));
        }
        self.complete(entry)
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            compressed: self.ledger.results().count(),
            failed: self.ledger.failures().count(),
        }
    }

    /// Saves the result at ledger position `index`.
    pub fn download_one(&self, index: usize) -> Result<PathBuf> {
        let result = self.ledger.result_at(index).ok_or(Error::NoSuchResult(index))?;
        self.downloads.download_one(result)
    }

    /// Staggered save of every result; see [`DownloadDispatcher::schedule_all`].
    pub fn download_all(
        &self,
    ) -> Result<impl std::future::Future<Output = Vec<DownloadReport>> + Send + 'static> {
        let results: Vec<CompressionResult> = self.ledger.results().cloned().collect();
        self.downloads.schedule_all(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::DirectorySink;
    use crate::presenter::RowLog;

    fn orchestrator() -> Orchestrator {
        let dir = std::env::temp_dir().join("image-compressor-panel-unused");
        Orchestrator::new(DownloadDispatcher::new(Arc::new(DirectorySink::new(dir))))
    }

    fn image(name: &str) -> SelectedFile {
        SelectedFile::new(name, "image/png", vec![0u8; 10])
    }

    #[test]
    fn rejected_selection_keeps_previous_batch() {
        let mut orch = orchestrator();
        orch.select(vec![image("a.png")]).unwrap();
        let err = orch
            .select(vec![SelectedFile::new("b.txt", "text/plain", vec![1u8])])
            .unwrap_err();
        assert!(matches!(err, Error::NoValidImages));
        assert_eq!(orch.batch().len(), 1);
        assert_eq!(orch.batch()[0].name(), "a.png");
    }

    #[test]
    fn start_needs_a_batch() {
        let mut orch = orchestrator();
        assert!(matches!(orch.start(&RawSettings::default()), Err(Error::EmptyBatch)));
        assert!(!orch.is_running());
    }

    #[test]
    fn second_start_while_running_is_busy() {
        let mut orch = orchestrator();
        orch.select(vec![image("a.png"), image("b.png")]).unwrap();
        orch.start(&RawSettings::default()).unwrap();
        assert!(matches!(orch.start(&RawSettings::default()), Err(Error::Busy)));
        assert_eq!(orch.progress(), Some((0, 2)));
    }

    #[test]
    fn invalid_settings_leave_state_idle() {
        let mut orch = orchestrator();
        orch.select(vec![image("a.png")]).unwrap();
        let settings = RawSettings {
            quality_percent: "250".into(),
            ..RawSettings::default()
        };
        assert!(matches!(orch.start(&settings), Err(Error::InvalidConfig { .. })));
        assert!(!orch.is_running());
    }

    #[test]
    fn stepping_through_a_run() {
        let mut orch = orchestrator();
        orch.select(vec![image("a.png"), image("b.png")]).unwrap();
        let job = orch.start(&RawSettings::default()).unwrap();
        assert_eq!(job.index, 0);
        assert_eq!(job.options.initial_quality, 0.8);

        let entry = LedgerEntry::Failed(CompressionFailure {
            source_name: "a.png".into(),
            reason: "boom".into(),
        });
        let Step::Next(job) = orch.complete(entry) else {
            panic!("expected a second job");
        };
        assert_eq!(job.file.name(), "b.png");

        let entry = LedgerEntry::Compressed(CompressionResult::new("b.png", 10, vec![0u8; 4].into()));
        let Step::Finished(summary) = orch.complete(entry) else {
            panic!("expected the run to finish");
        };
        assert_eq!(summary, BatchSummary { compressed: 1, failed: 1 });
        assert!(!orch.is_running());
    }

    #[test]
    fn selection_during_run_does_not_change_its_files() {
        let mut orch = orchestrator();
        orch.select(vec![image("a.png"), image("b.png")]).unwrap();
        orch.start(&RawSettings::default()).unwrap();
        orch.select(vec![image("z.png")]).unwrap();

        let entry = LedgerEntry::Compressed(CompressionResult::new("a.png", 10, vec![0u8; 4].into()));
        let Step::Next(job) = orch.complete(entry) else {
            panic!("expected a second job");
        };
        assert_eq!(job.file.name(), "b.png");
        assert_eq!(orch.batch()[0].name(), "z.png");
    }

    #[test]
    fn download_one_rejects_failed_entries() {
        let mut orch = orchestrator();
        orch.select(vec![image("a.png")]).unwrap();
        orch.start(&RawSettings::default()).unwrap();
        orch.complete(LedgerEntry::Failed(CompressionFailure {
            source_name: "a.png".into(),
            reason: "bad".into(),
        }));
        assert!(matches!(orch.download_one(0), Err(Error::NoSuchResult(0))));
        assert!(matches!(orch.download_all(), Err(Error::NothingToDownload)));
    }

    #[tokio::test]
    async fn garbage_input_becomes_a_failure_row() {
        let mut orch = orchestrator();
        orch.select(vec![image("zeros.png")]).unwrap();
        let mut rows = RowLog::default();
        let compressor: Arc<dyn Compressor> = Arc::new(crate::compression::ImageCompressor::new());

        let job = orch.start(&RawSettings::default()).unwrap();
        let entry = invoke(compressor, job).await;
        let Step::Finished(summary) = orch.record(entry, &mut rows) else {
            panic!("a one-file run should finish after one entry");
        };
        assert_eq!(summary, BatchSummary { compressed: 0, failed: 1 });
        assert!(matches!(rows.rows[0], (0, Row::Error { .. })));
    }

    #[test]
    fn record_outside_a_run_shows_nothing() {
        let mut orch = orchestrator();
        let mut rows = RowLog::default();
        let entry = LedgerEntry::Failed(CompressionFailure {
            source_name: "late.png".into(),
            reason: "bad".into(),
        });
        assert!(matches!(orch.record(entry, &mut rows), Step::Finished(_)));
        assert!(rows.rows.is_empty());
        assert!(orch.ledger().is_empty());
    }
}
