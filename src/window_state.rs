//! Window state reader
//!
//! Reads everything a single eligible window contributes to a snapshot:
//! placement, real and visible frames, title, and the owning-process
//! identity used to re-find the window after a restart.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StateReadError;
use crate::geometry::Rect;
use crate::platform::{Placement, ProcessId, WindowId, WindowSystem};

/// Resolved owning-process identity. The executable path is the restore
/// key; the name is kept for display. Both may be empty when resolution
/// failed, in which case the window can be restored but never relaunched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowIdentity {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub name: String,
}

impl WindowIdentity {
    pub fn from_path(path: String) -> Self {
        let name = path
            .rsplit(['\\', '/'])
            .next()
            .unwrap_or_default()
            .to_string();
        Self { path, name }
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Path comparison under the platform's case-insensitive filesystem.
    pub fn matches_path(&self, other: &str) -> bool {
        !self.path.is_empty() && self.path.eq_ignore_ascii_case(other)
    }
}

/// One captured window. Serialized records carry identity, placement, the
/// two frames and the title; the handle and pid hint are transient and
/// re-resolved at restore time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowRecord {
    pub identity: WindowIdentity,
    pub placement: Placement,
    #[serde(rename = "realRect")]
    pub real_rect: Rect,
    #[serde(rename = "visibleRect")]
    pub visible_rect: Rect,
    /// Diagnostics only, never a restore key.
    #[serde(default)]
    pub title: String,
    #[serde(skip)]
    pub window: Option<WindowId>,
    #[serde(skip)]
    pub pid: Option<ProcessId>,
}

/// Capture the full state of one window.
///
/// A failing placement or frame query fails the read and surfaces the OS
/// error; an unresolvable process identity does not: the record is kept
/// with an empty identity.
pub fn read_window<S: WindowSystem + ?Sized>(
    ws: &S,
    window: WindowId,
) -> Result<WindowRecord, StateReadError> {
    let placement = ws
        .placement(window)
        .map_err(|source| StateReadError::Placement { window, source })?;
    let real_rect = ws
        .frame_rect(window)
        .map_err(|source| StateReadError::Frame { window, source })?;
    // Compositor-extended bounds are version-gated; fall back to the frame.
    let visible_rect = ws.extended_frame_rect(window).unwrap_or(real_rect);
    let title = ws.title(window);

    let pid = ws.owner_pid(window);
    let identity = match pid.and_then(|pid| ws.process_path(pid)) {
        Some(path) => WindowIdentity::from_path(path),
        None => {
            warn!(window = %window, title = %title, "window has no resolvable process, capturing without identity");
            WindowIdentity::default()
        }
    };

    Ok(WindowRecord {
        identity,
        placement,
        real_rect,
        visible_rect,
        title,
        window: Some(window),
        pid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::{FakeWindowSystem, WindowSpec};

    #[test]
    fn reads_placement_frames_and_identity() {
        let ws = FakeWindowSystem::new();
        let pid = ws.add_process(r"C:\tools\editor.exe");
        let frame = Rect::new(10, 20, 810, 620);
        let w = ws.add_window(WindowSpec {
            title: "editor".to_string(),
            pid: Some(pid),
            frame,
            extended_frame: Some(Rect::new(20, 20, 800, 600)),
            ..Default::default()
        });

        let record = read_window(&ws, w).unwrap();
        assert_eq!(record.identity.path, r"C:\tools\editor.exe");
        assert_eq!(record.identity.name, "editor.exe");
        assert_eq!(record.real_rect, frame);
        assert_eq!(record.visible_rect, Rect::new(20, 20, 800, 600));
        assert_eq!(record.placement.normal_rect, frame);
        assert_eq!(record.title, "editor");
        assert_eq!(record.pid, Some(pid));
    }

    #[test]
    fn visible_rect_falls_back_to_real_rect() {
        let ws = FakeWindowSystem::new();
        let frame = Rect::new(0, 0, 400, 300);
        let w = ws.add_window(WindowSpec {
            frame,
            extended_frame: None,
            ..Default::default()
        });
        let record = read_window(&ws, w).unwrap();
        assert_eq!(record.visible_rect, record.real_rect);
    }

    #[test]
    fn unresolvable_identity_is_not_fatal() {
        let ws = FakeWindowSystem::new();
        let w = ws.add_window(WindowSpec {
            pid: None,
            ..Default::default()
        });
        let record = read_window(&ws, w).unwrap();
        assert!(record.identity.is_empty());
    }

    #[test]
    fn destroyed_window_fails_with_os_error() {
        let ws = FakeWindowSystem::new();
        let pid = ws.add_process(r"C:\gone.exe");
        let w = ws.add_window(WindowSpec {
            pid: Some(pid),
            ..Default::default()
        });
        ws.kill_process(pid);
        assert!(read_window(&ws, w).is_err());
    }

    #[test]
    fn record_serialization_skips_transient_fields() {
        let ws = FakeWindowSystem::new();
        let pid = ws.add_process(r"C:\app.exe");
        let w = ws.add_window(WindowSpec {
            pid: Some(pid),
            ..Default::default()
        });
        let record = read_window(&ws, w).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("window").is_none());
        assert!(json.get("pid").is_none());
        assert!(json.get("realRect").is_some());
        assert!(json.get("visibleRect").is_some());

        let back: WindowRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back.window, None);
        assert_eq!(back.pid, None);
        assert_eq!(back.real_rect, record.real_rect);
    }
}
