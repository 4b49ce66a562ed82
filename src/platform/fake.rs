//! Scripted in-memory window system
//!
//! Deterministic stand-in for the OS: tests script windows, processes,
//! monitors and launch behavior, then assert on recorded mutations. `sleep`
//! advances virtual time, so bounded retry loops run instantly.

use std::cell::RefCell;
use std::time::Duration;

use crate::error::PlatformError;
use crate::geometry::{Monitor, Point, Rect};
use crate::platform::{
    ExStyle, Placement, ProcessId, ProcessInfo, ReorderBatch, ShowState, WindowId, WindowSystem,
};

/// Description of a window to create in the fake system.
#[derive(Debug, Clone)]
pub struct WindowSpec {
    pub title: String,
    pub pid: Option<ProcessId>,
    pub visible: bool,
    pub ex_style: ExStyle,
    pub owner: Option<WindowId>,
    /// Overrides the last-active-popup lookup; defaults to the window itself.
    pub last_active_popup: Option<WindowId>,
    pub frame: Rect,
    pub extended_frame: Option<Rect>,
    pub show_state: ShowState,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            title: String::new(),
            pid: None,
            visible: true,
            ex_style: ExStyle::default(),
            owner: None,
            last_active_popup: None,
            frame: Rect::new(100, 100, 900, 700),
            extended_frame: None,
            show_state: ShowState::Normal,
        }
    }
}

#[derive(Debug, Clone)]
struct FakeWindow {
    id: WindowId,
    title: String,
    pid: Option<ProcessId>,
    visible: bool,
    ex_style: ExStyle,
    owner: Option<WindowId>,
    last_active_popup: Option<WindowId>,
    placement: Placement,
    frame: Rect,
    extended_frame: Option<Rect>,
}

#[derive(Debug, Clone)]
struct FakeProcess {
    pid: ProcessId,
    path: String,
    alive: bool,
}

#[derive(Debug, Clone)]
struct PendingWindow {
    pid: ProcessId,
    spec: WindowSpec,
    remaining_polls: u32,
}

#[derive(Default)]
struct State {
    // back-to-front: index 0 is the bottommost window
    windows: Vec<FakeWindow>,
    processes: Vec<FakeProcess>,
    monitors: Vec<Monitor>,
    // scripted launches: path -> (window spec, polls before it appears)
    scripted_launches: Vec<(String, WindowSpec, u32)>,
    pending_windows: Vec<PendingWindow>,
    launches: Vec<String>,
    reorder_commits: Vec<Vec<WindowId>>,
    placement_failures: Vec<WindowId>,
    fail_begin_reorder: bool,
    fail_place_above: Option<WindowId>,
    fail_commit: bool,
    foreground: Option<WindowId>,
    next_window: isize,
    next_pid: u32,
}

pub struct FakeWindowSystem {
    state: RefCell<State>,
}

impl FakeWindowSystem {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(State {
                next_window: 0x1000,
                next_pid: 100,
                ..State::default()
            }),
        }
    }

    pub fn add_monitor(&self, bounds: Rect, work_area: Rect) {
        self.state
            .borrow_mut()
            .monitors
            .push(Monitor { bounds, work_area });
    }

    pub fn remove_monitor(&self, index: usize) {
        self.state.borrow_mut().monitors.remove(index);
    }

    pub fn add_process(&self, path: &str) -> ProcessId {
        let mut state = self.state.borrow_mut();
        let pid = ProcessId(state.next_pid);
        state.next_pid += 1;
        state.processes.push(FakeProcess {
            pid,
            path: path.to_string(),
            alive: true,
        });
        pid
    }

    /// Kill a process and destroy its windows, as if the application exited.
    pub fn kill_process(&self, pid: ProcessId) {
        let mut state = self.state.borrow_mut();
        if let Some(p) = state.processes.iter_mut().find(|p| p.pid == pid) {
            p.alive = false;
        }
        state.windows.retain(|w| w.pid != Some(pid));
    }

    /// Create a window. Later additions stack in front of earlier ones.
    pub fn add_window(&self, spec: WindowSpec) -> WindowId {
        let mut state = self.state.borrow_mut();
        Self::materialize(&mut state, spec)
    }

    fn materialize(state: &mut State, spec: WindowSpec) -> WindowId {
        let id = WindowId(state.next_window);
        state.next_window += 0x10;
        state.windows.push(FakeWindow {
            id,
            title: spec.title,
            pid: spec.pid,
            visible: spec.visible,
            ex_style: spec.ex_style,
            owner: spec.owner,
            last_active_popup: spec.last_active_popup,
            placement: Placement {
                flags: 0,
                show_state: spec.show_state,
                min_position: Point::default(),
                max_position: Point::default(),
                normal_rect: spec.frame,
            },
            frame: spec.frame,
            extended_frame: spec.extended_frame,
        });
        id
    }

    /// Script `launch(path)`: the spawned process exposes `spec` as its main
    /// window after `delay_polls` sleeps (0 = immediately).
    pub fn script_launch(&self, path: &str, spec: WindowSpec, delay_polls: u32) {
        self.state
            .borrow_mut()
            .scripted_launches
            .push((path.to_string(), spec, delay_polls));
    }

    /// Script a window appearing for an already-running process after
    /// `delay_polls` sleeps, modelling a slow startup.
    pub fn script_delayed_window(&self, pid: ProcessId, mut spec: WindowSpec, delay_polls: u32) {
        spec.pid = Some(pid);
        self.state.borrow_mut().pending_windows.push(PendingWindow {
            pid,
            spec,
            remaining_polls: delay_polls,
        });
    }

    /// Make the next `set_placement` on `window` fail.
    pub fn fail_placement(&self, window: WindowId) {
        self.state.borrow_mut().placement_failures.push(window);
    }

    pub fn fail_begin_reorder(&self) {
        self.state.borrow_mut().fail_begin_reorder = true;
    }

    /// Make enqueueing `window` into a reorder batch fail.
    pub fn fail_place_above(&self, window: WindowId) {
        self.state.borrow_mut().fail_place_above = Some(window);
    }

    /// Make the reorder commit fail; no stacking change is applied.
    pub fn fail_commit(&self) {
        self.state.borrow_mut().fail_commit = true;
    }

    // -- assertion helpers ---------------------------------------------------

    pub fn launches(&self) -> Vec<String> {
        self.state.borrow().launches.clone()
    }

    pub fn reorder_commits(&self) -> Vec<Vec<WindowId>> {
        self.state.borrow().reorder_commits.clone()
    }

    pub fn placement_of(&self, window: WindowId) -> Option<Placement> {
        self.state
            .borrow()
            .windows
            .iter()
            .find(|w| w.id == window)
            .map(|w| w.placement)
    }

    /// The frontmost window of a process, if any.
    pub fn window_of_pid(&self, pid: ProcessId) -> Option<WindowId> {
        self.state
            .borrow()
            .windows
            .iter()
            .rev()
            .find(|w| w.pid == Some(pid))
            .map(|w| w.id)
    }

    /// Current back-to-front z-order.
    pub fn z_order(&self) -> Vec<WindowId> {
        self.state.borrow().windows.iter().map(|w| w.id).collect()
    }

    fn with_window<T>(&self, window: WindowId, f: impl FnOnce(&FakeWindow) -> T) -> Option<T> {
        self.state
            .borrow()
            .windows
            .iter()
            .find(|w| w.id == window)
            .map(f)
    }
}

impl Default for FakeWindowSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowSystem for FakeWindowSystem {
    fn enumerate_windows(&self) -> Result<Vec<WindowId>, PlatformError> {
        Ok(self.z_order())
    }

    fn is_visible(&self, window: WindowId) -> bool {
        self.with_window(window, |w| w.visible).unwrap_or(false)
    }

    fn ex_style(&self, window: WindowId) -> ExStyle {
        self.with_window(window, |w| w.ex_style).unwrap_or_default()
    }

    fn root_owner(&self, window: WindowId) -> WindowId {
        let state = self.state.borrow();
        let mut current = window;
        loop {
            let owner = state
                .windows
                .iter()
                .find(|w| w.id == current)
                .and_then(|w| w.owner);
            match owner {
                Some(o) if o != current => current = o,
                _ => return current,
            }
        }
    }

    fn last_active_popup(&self, window: WindowId) -> WindowId {
        self.with_window(window, |w| w.last_active_popup.unwrap_or(window))
            .unwrap_or(window)
    }

    fn title(&self, window: WindowId) -> String {
        self.with_window(window, |w| w.title.clone())
            .unwrap_or_default()
    }

    fn owner_pid(&self, window: WindowId) -> Option<ProcessId> {
        self.with_window(window, |w| w.pid).flatten()
    }

    fn placement(&self, window: WindowId) -> Result<Placement, PlatformError> {
        self.with_window(window, |w| w.placement)
            .ok_or(PlatformError::InvalidWindow(window))
    }

    fn set_placement(&self, window: WindowId, placement: &Placement) -> Result<(), PlatformError> {
        let mut state = self.state.borrow_mut();
        if let Some(pos) = state.placement_failures.iter().position(|w| *w == window) {
            state.placement_failures.remove(pos);
            return Err(PlatformError::Os {
                call: "SetWindowPlacement",
                code: 5,
                message: "access denied".to_string(),
            });
        }
        let w = state
            .windows
            .iter_mut()
            .find(|w| w.id == window)
            .ok_or(PlatformError::InvalidWindow(window))?;
        w.placement = *placement;
        // Move the frame along, keeping the compositor margins attached to it.
        let old = w.frame;
        w.frame = placement.normal_rect;
        if let Some(ext) = w.extended_frame {
            w.extended_frame = Some(Rect::new(
                w.frame.left + (ext.left - old.left),
                w.frame.top + (ext.top - old.top),
                w.frame.right + (ext.right - old.right),
                w.frame.bottom + (ext.bottom - old.bottom),
            ));
        }
        w.visible = placement.show_state != ShowState::Hide;
        Ok(())
    }

    fn frame_rect(&self, window: WindowId) -> Result<Rect, PlatformError> {
        self.with_window(window, |w| w.frame)
            .ok_or(PlatformError::InvalidWindow(window))
    }

    fn extended_frame_rect(&self, window: WindowId) -> Option<Rect> {
        self.with_window(window, |w| w.extended_frame).flatten()
    }

    fn monitors(&self) -> Vec<Monitor> {
        self.state.borrow().monitors.clone()
    }

    fn processes(&self) -> Vec<ProcessInfo> {
        self.state
            .borrow()
            .processes
            .iter()
            .filter(|p| p.alive)
            .map(|p| ProcessInfo {
                pid: p.pid,
                path: p.path.clone(),
            })
            .collect()
    }

    fn process_alive(&self, pid: ProcessId) -> bool {
        self.state
            .borrow()
            .processes
            .iter()
            .any(|p| p.pid == pid && p.alive)
    }

    fn process_path(&self, pid: ProcessId) -> Option<String> {
        self.state
            .borrow()
            .processes
            .iter()
            .find(|p| p.pid == pid && p.alive)
            .map(|p| p.path.clone())
    }

    fn launch(&self, path: &str) -> Result<ProcessId, PlatformError> {
        let mut state = self.state.borrow_mut();
        state.launches.push(path.to_string());
        let scripted = state
            .scripted_launches
            .iter()
            .position(|(p, _, _)| p == path);
        let Some(pos) = scripted else {
            return Err(PlatformError::Launch {
                message: format!("no such executable: {path}"),
            });
        };
        let (_, spec, delay) = state.scripted_launches.remove(pos);
        let pid = ProcessId(state.next_pid);
        state.next_pid += 1;
        state.processes.push(FakeProcess {
            pid,
            path: path.to_string(),
            alive: true,
        });
        let mut spec = spec;
        spec.pid = Some(pid);
        if delay == 0 {
            Self::materialize(&mut state, spec);
        } else {
            state.pending_windows.push(PendingWindow {
                pid,
                spec,
                remaining_polls: delay,
            });
        }
        Ok(pid)
    }

    fn foreground_window(&self) -> Option<WindowId> {
        self.state.borrow().foreground
    }

    fn set_foreground_window(&self, window: WindowId) {
        self.state.borrow_mut().foreground = Some(window);
    }

    fn begin_reorder(&self, capacity: usize) -> Result<Box<dyn ReorderBatch + '_>, PlatformError> {
        if self.state.borrow().fail_begin_reorder {
            return Err(PlatformError::Os {
                call: "BeginDeferWindowPos",
                code: 8,
                message: "not enough memory".to_string(),
            });
        }
        Ok(Box::new(FakeReorderBatch {
            system: self,
            capacity,
            ops: Vec::new(),
        }))
    }

    fn sleep(&self, _duration: Duration) {
        // Virtual time: one sleep is one poll tick.
        let mut state = self.state.borrow_mut();
        let mut due = Vec::new();
        for pending in &mut state.pending_windows {
            if pending.remaining_polls > 0 {
                pending.remaining_polls -= 1;
            }
            if pending.remaining_polls == 0 {
                due.push(pending.pid);
            }
        }
        let mut ready: Vec<PendingWindow> = Vec::new();
        state.pending_windows.retain(|p| {
            if due.contains(&p.pid) {
                ready.push(p.clone());
                false
            } else {
                true
            }
        });
        for pending in ready {
            Self::materialize(&mut state, pending.spec);
        }
    }
}

struct FakeReorderBatch<'a> {
    system: &'a FakeWindowSystem,
    capacity: usize,
    ops: Vec<WindowId>,
}

impl ReorderBatch for FakeReorderBatch<'_> {
    fn place_above(
        &mut self,
        window: WindowId,
        previous: Option<WindowId>,
    ) -> Result<(), PlatformError> {
        if self.system.state.borrow().fail_place_above == Some(window) {
            return Err(PlatformError::Os {
                call: "DeferWindowPos",
                code: 1400,
                message: "invalid window handle".to_string(),
            });
        }
        if self.ops.len() >= self.capacity {
            return Err(PlatformError::Os {
                call: "DeferWindowPos",
                code: 8,
                message: "transaction capacity exceeded".to_string(),
            });
        }
        if previous != self.ops.last().copied() {
            return Err(PlatformError::Os {
                call: "DeferWindowPos",
                code: 87,
                message: "broken reorder chain".to_string(),
            });
        }
        self.ops.push(window);
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<(), PlatformError> {
        let mut state = self.system.state.borrow_mut();
        if state.fail_commit {
            return Err(PlatformError::Os {
                call: "EndDeferWindowPos",
                code: 5,
                message: "access denied".to_string(),
            });
        }
        // Lift the batch to the top as one unit, preserving its back-to-front
        // order, exactly like the deferred native transaction.
        let mut lifted = Vec::new();
        state.windows.retain(|w| {
            if self.ops.contains(&w.id) {
                lifted.push(w.clone());
                false
            } else {
                true
            }
        });
        for id in &self.ops {
            if let Some(w) = lifted.iter().find(|w| w.id == *id) {
                state.windows.push(w.clone());
            }
        }
        state.reorder_commits.push(self.ops);
        Ok(())
    }
}
