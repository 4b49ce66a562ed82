//! Restore engine
//!
//! Reproduces a snapshot against the live OS in two strictly ordered
//! phases: per-window placement restore (with process re-acquisition and
//! monitor-bounds correction), then a single atomic batched z-order
//! reconstruction. A failing window never aborts the batch.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::constants::restore as budget;
use crate::error::{PlatformError, RestoreError, RestoreFailure};
use crate::geometry::{self, Monitor, Rect};
use crate::platform::{Placement, ProcessId, WindowId, WindowSystem};
use crate::snapshot::Snapshot;
use crate::window_state::{WindowIdentity, WindowRecord};

/// How the live window was obtained in phase 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    /// The capture-time process was still alive with the same executable.
    ReusedProcess,
    /// Another running process matched the recorded executable path.
    FoundRunning,
    /// The executable was launched again.
    Relaunched,
}

/// Terminal per-window result of a restore.
#[derive(Debug, Clone)]
pub enum Outcome {
    Restored(Acquisition),
    /// No live process, and no identity to relaunch from.
    SkippedMissing,
    Failed(RestoreFailure),
}

#[derive(Debug, Clone)]
pub struct ReportEntry {
    pub identity: WindowIdentity,
    pub title: String,
    pub outcome: Outcome,
}

/// Per-window outcomes plus the result of the reorder phase.
#[derive(Debug)]
pub struct RestoreReport {
    pub windows: Vec<ReportEntry>,
    /// Number of windows enqueued in the committed reorder batch.
    pub reordered: usize,
    /// A mid-batch or commit failure: placements from phase 1 stand, only
    /// stacking may be wrong.
    pub reorder_error: Option<PlatformError>,
}

impl RestoreReport {
    pub fn restored(&self) -> usize {
        self.windows
            .iter()
            .filter(|e| matches!(e.outcome, Outcome::Restored(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.windows
            .iter()
            .filter(|e| matches!(e.outcome, Outcome::Failed(_)))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.windows
            .iter()
            .filter(|e| matches!(e.outcome, Outcome::SkippedMissing))
            .count()
    }
}

enum Acquired {
    Window(WindowId, Acquisition),
    Missing,
    Failed(RestoreFailure),
}

pub struct RestoreEngine<'a, S: WindowSystem + ?Sized> {
    ws: &'a S,
}

impl<'a, S: WindowSystem + ?Sized> RestoreEngine<'a, S> {
    pub fn new(ws: &'a S) -> Self {
        Self { ws }
    }

    /// Restore every record of the snapshot, then rebuild z-order.
    ///
    /// Phase 2 does not begin until phase 1 has been attempted for every
    /// record. Only a failure to begin the batched transaction aborts the
    /// whole operation; everything else is contained per window and
    /// reported.
    pub fn restore(&self, snapshot: &Snapshot) -> Result<RestoreReport, RestoreError> {
        let monitors = self.ws.monitors();
        let mut claimed: Vec<WindowId> = Vec::new();
        let mut entries = Vec::with_capacity(snapshot.records().len());
        let mut live: Vec<Option<WindowId>> = Vec::with_capacity(snapshot.records().len());

        for record in snapshot.records() {
            let (window, outcome) = match self.acquire(record, &claimed) {
                Acquired::Window(window, acquisition) => {
                    claimed.push(window);
                    match self.place(record, window, &monitors) {
                        Ok(()) => {
                            info!(
                                window = %window,
                                title = %record.title,
                                acquisition = ?acquisition,
                                "window restored"
                            );
                            (Some(window), Outcome::Restored(acquisition))
                        }
                        Err(failure) => {
                            warn!(window = %window, error = %failure, "placement apply failed");
                            (None, Outcome::Failed(failure))
                        }
                    }
                }
                Acquired::Missing => {
                    info!(title = %record.title, "window skipped, no process and no identity");
                    (None, Outcome::SkippedMissing)
                }
                Acquired::Failed(failure) => {
                    warn!(title = %record.title, error = %failure, "window restore failed");
                    (None, Outcome::Failed(failure))
                }
            };
            live.push(window);
            entries.push(ReportEntry {
                identity: record.identity.clone(),
                title: record.title.clone(),
                outcome,
            });
        }

        let (reordered, reorder_error) = self.reorder(&live)?;
        Ok(RestoreReport {
            windows: entries,
            reordered,
            reorder_error,
        })
    }

    /// Phase 2: one batched transaction replaying the snapshot's
    /// back-to-front order over the windows that are still live and visible.
    fn reorder(
        &self,
        live: &[Option<WindowId>],
    ) -> Result<(usize, Option<PlatformError>), RestoreError> {
        let batch: Vec<WindowId> = live
            .iter()
            .flatten()
            .copied()
            .filter(|w| self.ws.is_visible(*w))
            .collect();

        let mut tx = self
            .ws
            .begin_reorder(batch.len())
            .map_err(|source| RestoreError::TransactionBegin { source })?;

        let mut previous = None;
        let mut enqueued = 0;
        let mut error = None;
        for &window in &batch {
            if let Err(err) = tx.place_above(window, previous) {
                warn!(window = %window, error = %err, "reorder enqueue failed");
                error = Some(err);
                break;
            }
            enqueued += 1;
            previous = Some(window);
        }
        // Commit whatever was enqueued; never abandon the transaction.
        if let Err(err) = tx.commit() {
            warn!(error = %err, "reorder commit failed, stacking may be wrong");
            if error.is_none() {
                error = Some(err);
            }
        }
        debug!(windows = enqueued, "z-order batch committed");
        Ok((enqueued, error))
    }

    fn acquire(&self, record: &WindowRecord, claimed: &[WindowId]) -> Acquired {
        // Same process still alive with the same executable: reuse it.
        if let Some(pid) = record.pid {
            if self.ws.process_alive(pid) && self.same_executable(pid, &record.identity) {
                if let Some(window) = self.find_window(record, pid, claimed) {
                    return Acquired::Window(window, Acquisition::ReusedProcess);
                }
            }
        }

        if record.identity.is_empty() {
            return Acquired::Missing;
        }

        // Any running process with the recorded executable path.
        let running = self
            .ws
            .processes()
            .into_iter()
            .find(|p| record.identity.matches_path(&p.path));
        if let Some(proc_info) = running {
            if let Some(window) = self.poll_for_window(
                record,
                proc_info.pid,
                budget::REDISCOVER_ATTEMPTS,
                budget::REDISCOVER_BACKOFF,
                claimed,
            ) {
                return Acquired::Window(window, Acquisition::FoundRunning);
            }
            debug!(
                pid = %proc_info.pid,
                path = %record.identity.path,
                "running process never exposed a window, treating as relaunch"
            );
        }

        // Relaunch, at most once per record.
        let path = record.identity.path.clone();
        let pid = match self.ws.launch(&path) {
            Ok(pid) => pid,
            Err(source) => return Acquired::Failed(RestoreFailure::LaunchFailed { path, source }),
        };
        info!(pid = %pid, path = %path, "relaunched executable, waiting for its main window");
        match self.poll_for_window(
            record,
            pid,
            budget::LAUNCH_ATTEMPTS,
            budget::LAUNCH_BACKOFF,
            claimed,
        ) {
            Some(window) => Acquired::Window(window, Acquisition::Relaunched),
            None => Acquired::Failed(RestoreFailure::RelaunchTimeout { path }),
        }
    }

    fn same_executable(&self, pid: ProcessId, identity: &WindowIdentity) -> bool {
        // An empty identity cannot contradict the pid; liveness is enough.
        if identity.is_empty() {
            return true;
        }
        match self.ws.process_path(pid) {
            Some(path) => identity.matches_path(&path),
            None => false,
        }
    }

    /// A live, unclaimed, eligible window of `pid`. The capture-time handle
    /// is preferred while it is still valid (handles are stable within one
    /// process lifetime); otherwise the frontmost eligible window wins.
    fn find_window(
        &self,
        record: &WindowRecord,
        pid: ProcessId,
        claimed: &[WindowId],
    ) -> Option<WindowId> {
        let windows = self.ws.enumerate_windows().ok()?;
        if let Some(handle) = record.window {
            if windows.contains(&handle)
                && !claimed.contains(&handle)
                && self.ws.owner_pid(handle) == Some(pid)
            {
                return Some(handle);
            }
        }
        windows
            .into_iter()
            .rev()
            .filter(|w| !claimed.contains(w))
            .filter(|w| self.ws.owner_pid(*w) == Some(pid))
            .find(|w| crate::eligibility::is_eligible(self.ws, *w))
    }

    fn poll_for_window(
        &self,
        record: &WindowRecord,
        pid: ProcessId,
        attempts: u32,
        backoff: Duration,
        claimed: &[WindowId],
    ) -> Option<WindowId> {
        for attempt in 0..attempts {
            if let Some(window) = self.find_window(record, pid, claimed) {
                return Some(window);
            }
            if attempt + 1 < attempts {
                self.ws.sleep(backoff);
            }
        }
        None
    }

    fn place(
        &self,
        record: &WindowRecord,
        window: WindowId,
        monitors: &[Monitor],
    ) -> Result<(), RestoreFailure> {
        let target = corrected_rect(record, monitors);
        let placement = Placement {
            normal_rect: target,
            ..record.placement
        };
        self.ws
            .set_placement(window, &placement)
            .map_err(|source| RestoreFailure::PlacementApply { window, source })
    }
}

/// Target rectangle for a record under the current display layout: the
/// recorded visible frame clamped into the nearest monitor's working area,
/// translated back to real-frame coordinates with the recorded margins
/// preserved. With no monitors to correct against, the recorded rectangle
/// is used as-is.
pub fn corrected_rect(record: &WindowRecord, monitors: &[Monitor]) -> Rect {
    match geometry::nearest_monitor(&record.visible_rect, monitors) {
        Some(monitor) => {
            geometry::fit_to_work_area(record.real_rect, record.visible_rect, monitor.work_area).0
        }
        None => record.real_rect,
    }
}
