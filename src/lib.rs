//! Batch image compression behind a small desktop panel.
//!
//! The panel binary maps each user action onto an [`Orchestrator`] method:
//! pick files, compress them one after another, then save the results
//! individually or all at once with a fixed stagger between saves.

pub mod compression;
pub mod config;
pub mod download;
pub mod error;
pub mod intake;
pub mod ledger;
pub mod logging;
pub mod orchestrator;
pub mod presenter;

pub use compression::{CompressionOptions, Compressor, ImageCompressor};
pub use config::{CompressionConfig, RawSettings};
pub use download::{download_filename, DirectorySink, DownloadDispatcher, DownloadSink};
pub use error::{CompressionError, Error, Result};
pub use intake::{DropGesture, SelectedFile};
pub use ledger::{CompressionFailure, CompressionResult, Ledger, LedgerEntry};
pub use orchestrator::{BatchSummary, Job, Orchestrator, Step};
