//! Platform seam between the snapshot/restore core and the OS window manager
//!
//! The core only talks to [`WindowSystem`] and [`ReorderBatch`]; the Win32
//! backend lives in `win32`, and `fake` provides a scripted in-memory
//! implementation used by tests (and the only one available off-Windows).

pub mod fake;
#[cfg(windows)]
pub mod win32;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PlatformError;
use crate::geometry::{Monitor, Point, Rect};

/// Opaque top-level window handle.
///
/// Valid only within one process lifetime: never serialized and never
/// compared across a snapshot/restore boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub isize);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// OS process id. A transient hint, like [`WindowId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessId(pub u32);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two extended style bits the eligibility classifier cares about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExStyle {
    pub app_window: bool,
    pub tool_window: bool,
}

/// Window show state, mirroring the native show-command repertoire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowState {
    Hide,
    Normal,
    Minimized,
    Maximized,
    ShowNoActivate,
    Show,
    Minimize,
    ShowMinNoActive,
    ShowNa,
    Restore,
    ShowDefault,
    ForceMinimize,
}

impl ShowState {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::Hide,
            2 => Self::Minimized,
            3 => Self::Maximized,
            4 => Self::ShowNoActivate,
            5 => Self::Show,
            6 => Self::Minimize,
            7 => Self::ShowMinNoActive,
            8 => Self::ShowNa,
            9 => Self::Restore,
            10 => Self::ShowDefault,
            11 => Self::ForceMinimize,
            _ => Self::Normal,
        }
    }

    pub fn as_raw(self) -> u32 {
        match self {
            Self::Hide => 0,
            Self::Normal => 1,
            Self::Minimized => 2,
            Self::Maximized => 3,
            Self::ShowNoActivate => 4,
            Self::Show => 5,
            Self::Minimize => 6,
            Self::ShowMinNoActive => 7,
            Self::ShowNa => 8,
            Self::Restore => 9,
            Self::ShowDefault => 10,
            Self::ForceMinimize => 11,
        }
    }
}

/// Full window placement: show state, the normal-state rectangle and the
/// minimized/maximized position hints. Sufficient to restore a window's
/// on-screen representation independent of its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub flags: u32,
    pub show_state: ShowState,
    pub min_position: Point,
    pub max_position: Point,
    pub normal_rect: Rect,
}

/// One running process as seen by the process subsystem. `path` is empty
/// when the executable path is not accessible (e.g. access denied).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: ProcessId,
    pub path: String,
}

/// Synchronous, blocking access to the OS window manager, process and
/// display subsystems. All queries read live, uncontrolled shared state:
/// nothing is assumed stable between enumeration and use.
pub trait WindowSystem {
    /// All top-level windows in back-to-front order (bottommost first).
    fn enumerate_windows(&self) -> Result<Vec<WindowId>, PlatformError>;

    fn is_visible(&self, window: WindowId) -> bool;

    fn ex_style(&self, window: WindowId) -> ExStyle;

    /// Root owner ancestor of the window (the window itself if unowned).
    fn root_owner(&self, window: WindowId) -> WindowId;

    /// The window's last active popup, or the window itself if none.
    fn last_active_popup(&self, window: WindowId) -> WindowId;

    fn title(&self, window: WindowId) -> String;

    fn owner_pid(&self, window: WindowId) -> Option<ProcessId>;

    fn placement(&self, window: WindowId) -> Result<Placement, PlatformError>;

    fn set_placement(&self, window: WindowId, placement: &Placement) -> Result<(), PlatformError>;

    /// The window's nominal frame rectangle.
    fn frame_rect(&self, window: WindowId) -> Result<Rect, PlatformError>;

    /// Compositor-extended frame bounds, if the OS exposes them.
    fn extended_frame_rect(&self, window: WindowId) -> Option<Rect>;

    /// Connected displays with bounds and working areas.
    fn monitors(&self) -> Vec<Monitor>;

    fn processes(&self) -> Vec<ProcessInfo>;

    fn process_alive(&self, pid: ProcessId) -> bool;

    /// Executable path for a process, `None` when inaccessible.
    fn process_path(&self, pid: ProcessId) -> Option<String>;

    /// Start a new process from an executable path.
    fn launch(&self, path: &str) -> Result<ProcessId, PlatformError>;

    fn foreground_window(&self) -> Option<WindowId>;

    fn set_foreground_window(&self, window: WindowId);

    /// Open a batched z-order transaction sized for `capacity` windows.
    /// Every enqueued move is applied atomically on commit.
    fn begin_reorder(&self, capacity: usize) -> Result<Box<dyn ReorderBatch + '_>, PlatformError>;

    /// Blocking sleep, routed through the trait so scripted platforms can
    /// advance virtual time instead.
    fn sleep(&self, duration: Duration);
}

/// A single batched window-positioning transaction.
///
/// Acquired once per restore, mutated per window, committed exactly once.
/// Moves must suppress move/resize/activate side effects; only stacking
/// changes.
pub trait ReorderBatch {
    /// Enqueue "place `window` just above `previous`"; `previous` is `None`
    /// for the bottommost window of the batch.
    fn place_above(
        &mut self,
        window: WindowId,
        previous: Option<WindowId>,
    ) -> Result<(), PlatformError>;

    /// Apply every enqueued move atomically. Consumes the transaction, so
    /// it is released on every exit path.
    fn commit(self: Box<Self>) -> Result<(), PlatformError>;
}
