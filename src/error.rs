use thiserror::Error;

use crate::platform::WindowId;

/// Failure of a single OS call, carrying the native error code and message.
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    #[error("{call} failed with OS error {code}: {message}")]
    Os {
        call: &'static str,
        code: i32,
        message: String,
    },
    #[error("window {0} is no longer valid")]
    InvalidWindow(WindowId),
    #[error("process launch failed: {message}")]
    Launch { message: String },
}

/// A single window's state could not be read during capture.
///
/// Capture treats this as a skip for that window only; the snapshot
/// continues with the remaining windows.
#[derive(Debug, Clone, Error)]
pub enum StateReadError {
    #[error("failed to read placement of window {window}: {source}")]
    Placement {
        window: WindowId,
        source: PlatformError,
    },
    #[error("failed to read frame of window {window}: {source}")]
    Frame {
        window: WindowId,
        source: PlatformError,
    },
}

/// Terminal failure of one window during restore. Never aborts the batch.
#[derive(Debug, Clone, Error)]
pub enum RestoreFailure {
    #[error("launching {path:?} failed: {source}")]
    LaunchFailed { path: String, source: PlatformError },
    #[error("no main window appeared for {path:?} within the retry budget")]
    RelaunchTimeout { path: String },
    #[error("applying placement to window {window} failed: {source}")]
    PlacementApply {
        window: WindowId,
        source: PlatformError,
    },
}

/// Whole-operation restore failure.
///
/// Per-window problems are reported in the [`RestoreReport`] instead; only a
/// failure to even begin the batched reorder transaction aborts the
/// operation as a whole.
///
/// [`RestoreReport`]: crate::restore::RestoreReport
#[derive(Debug, Clone, Error)]
pub enum RestoreError {
    #[error("could not begin the window reorder transaction: {source}")]
    TransactionBegin { source: PlatformError },
}
