//! Batch reconciliation of an MP3 library
//!
//! [`BatchRunner::run`] is meant to be the body of a single worker task.
//! It reports through a bounded [`RunEvent`] channel and stops between
//! cohorts once its cancellation token fires.

mod discovery;
mod error;
mod ledger;
mod progress;
mod runner;

pub use discovery::find_audio_files;
pub use error::{Result, RunError};
pub use ledger::{
    ErrorRecord, Ledger, NotFoundRecord, ERROR_LEDGER_FILE, NOT_FOUND_LEDGER_FILE,
    REASON_NO_LABEL, REASON_NO_RESULT,
};
pub use progress::{channel, ProgressSender, RunEvent, DEFAULT_CAPACITY};
pub use runner::{BatchRunner, RunOptions, RunReport};
pub use tokio_util::sync::CancellationToken;
