//! Snapshots: an immutable capture of the current window arrangement

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::eligibility::is_eligible;
use crate::error::PlatformError;
use crate::platform::WindowSystem;
use crate::window_state::{WindowRecord, read_window};

/// Ordered per-monitor pixel areas of the display configuration at capture
/// time. Used only to flag configuration changes for presentation; restore
/// correctness never depends on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorFingerprint(Vec<i64>);

impl MonitorFingerprint {
    pub fn capture<S: WindowSystem + ?Sized>(ws: &S) -> Self {
        Self(
            ws.monitors()
                .iter()
                .map(|m| m.bounds.width() as i64 * m.bounds.height() as i64)
                .collect(),
        )
    }

    pub fn monitor_count(&self) -> usize {
        self.0.len()
    }

    pub fn differs_from(&self, other: &MonitorFingerprint) -> bool {
        self.0 != other.0
    }
}

/// Immutable-after-construction capture of every eligible window, in strict
/// back-to-front order. The record order is the sole source of truth for
/// z-order restoration.
#[derive(Debug, Clone)]
pub struct Snapshot {
    name: Option<String>,
    taken_at: DateTime<Utc>,
    user_initiated: bool,
    fingerprint: MonitorFingerprint,
    records: Vec<WindowRecord>,
}

impl Snapshot {
    /// Enumerate all top-level windows exactly once, keep the eligible ones,
    /// and record them in enumeration order. A window whose state cannot be
    /// read is skipped; the capture continues.
    pub fn capture<S: WindowSystem + ?Sized>(
        ws: &S,
        user_initiated: bool,
        name: Option<String>,
    ) -> Result<Self, PlatformError> {
        let mut records = Vec::new();
        for window in ws.enumerate_windows()? {
            if !is_eligible(ws, window) {
                continue;
            }
            match read_window(ws, window) {
                Ok(record) => {
                    debug!(window = %window, title = %record.title, "captured window");
                    records.push(record);
                }
                Err(err) => {
                    warn!(window = %window, error = %err, "skipping window, state read failed");
                }
            }
        }
        Ok(Self {
            name,
            taken_at: Utc::now(),
            user_initiated,
            fingerprint: MonitorFingerprint::capture(ws),
            records,
        })
    }

    /// Rebuild a snapshot from deserialized records. Retained snapshots are
    /// treated as user-initiated and stamped at reconstruction time.
    pub fn from_records(name: Option<String>, records: Vec<WindowRecord>) -> Self {
        Self {
            name,
            taken_at: Utc::now(),
            user_initiated: true,
            fingerprint: MonitorFingerprint(Vec::new()),
            records,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    pub fn user_initiated(&self) -> bool {
        self.user_initiated
    }

    pub fn fingerprint(&self) -> &MonitorFingerprint {
        &self.fingerprint
    }

    /// Captured windows, back-to-front.
    pub fn records(&self) -> &[WindowRecord] {
        &self.records
    }

    /// The snapshot's name, or its capture time formatted for display.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self
                .taken_at
                .with_timezone(&Local)
                .format("%-d %B, %H:%M:%S")
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::platform::fake::{FakeWindowSystem, WindowSpec};
    use crate::platform::{ExStyle, ShowState};

    fn system_with_monitor() -> FakeWindowSystem {
        let ws = FakeWindowSystem::new();
        ws.add_monitor(Rect::new(0, 0, 1920, 1080), Rect::new(0, 0, 1920, 1040));
        ws
    }

    #[test]
    fn capture_keeps_eligible_windows_in_enumeration_order() {
        let ws = system_with_monitor();
        let pid = ws.add_process(r"C:\a.exe");
        let back = ws.add_window(WindowSpec {
            title: "back".to_string(),
            pid: Some(pid),
            ..Default::default()
        });
        // Tool window between the two must be filtered out
        ws.add_window(WindowSpec {
            title: "palette".to_string(),
            pid: Some(pid),
            ex_style: ExStyle {
                app_window: false,
                tool_window: true,
            },
            ..Default::default()
        });
        let front = ws.add_window(WindowSpec {
            title: "front".to_string(),
            pid: Some(pid),
            ..Default::default()
        });

        let snapshot = Snapshot::capture(&ws, true, None).unwrap();
        let titles: Vec<_> = snapshot.records().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["back", "front"]);
        assert_eq!(snapshot.records()[0].window, Some(back));
        assert_eq!(snapshot.records()[1].window, Some(front));
    }

    #[test]
    fn capture_records_minimized_show_state() {
        let ws = system_with_monitor();
        let pid = ws.add_process(r"C:\a.exe");
        ws.add_window(WindowSpec {
            pid: Some(pid),
            show_state: ShowState::Minimized,
            ..Default::default()
        });
        let snapshot = Snapshot::capture(&ws, false, None).unwrap();
        assert_eq!(snapshot.records().len(), 1);
        assert_eq!(
            snapshot.records()[0].placement.show_state,
            ShowState::Minimized
        );
    }

    #[test]
    fn fingerprint_reflects_monitor_areas_in_order() {
        let ws = FakeWindowSystem::new();
        ws.add_monitor(Rect::new(0, 0, 1920, 1080), Rect::new(0, 0, 1920, 1040));
        ws.add_monitor(
            Rect::new(1920, 0, 3200, 1024),
            Rect::new(1920, 0, 3200, 1024),
        );
        let fp = MonitorFingerprint::capture(&ws);
        assert_eq!(fp.monitor_count(), 2);

        ws.remove_monitor(1);
        let fp2 = MonitorFingerprint::capture(&ws);
        assert!(fp.differs_from(&fp2));
    }

    #[test]
    fn display_name_prefers_explicit_name() {
        let snapshot = Snapshot::from_records(Some("work layout".to_string()), Vec::new());
        assert_eq!(snapshot.display_name(), "work layout");

        let unnamed = Snapshot::from_records(None, Vec::new());
        // Falls back to a formatted capture time
        assert!(!unnamed.display_name().is_empty());
    }

    #[test]
    fn unnamed_snapshot_is_timestamped() {
        let ws = system_with_monitor();
        let snapshot = Snapshot::capture(&ws, false, None).unwrap();
        assert!(snapshot.name().is_none());
        assert!(!snapshot.user_initiated());
        assert!(snapshot.taken_at() <= Utc::now());
    }
}
