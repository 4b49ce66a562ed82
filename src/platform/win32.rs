//! Native Win32 backend
//!
//! Thin, synchronous wrappers over the window-manager, process and display
//! APIs. No state is cached: every query goes to the OS, because windows
//! appear and vanish at any time.

use std::ffi::c_void;
use std::mem;
use std::time::Duration;

use windows::Win32::Foundation::{CloseHandle, HWND, LPARAM, POINT, RECT, STILL_ACTIVE};
use windows::Win32::Graphics::Dwm::{DWMWA_EXTENDED_FRAME_BOUNDS, DwmGetWindowAttribute};
use windows::Win32::Graphics::Gdi::{
    EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFO,
};
use windows::Win32::System::ProcessStatus::EnumProcesses;
use windows::Win32::System::Threading::{
    GetExitCodeProcess, OpenProcess, PROCESS_NAME_WIN32, PROCESS_QUERY_LIMITED_INFORMATION,
    QueryFullProcessImageNameW,
};
use windows::Win32::UI::WindowsAndMessaging::{
    BeginDeferWindowPos, DeferWindowPos, EndDeferWindowPos, EnumWindows, GA_ROOTOWNER,
    GWL_EXSTYLE, GetAncestor, GetForegroundWindow, GetLastActivePopup, GetWindowLongPtrW,
    GetWindowPlacement, GetWindowRect, GetWindowTextW, GetWindowThreadProcessId, HDWP, HWND_TOP,
    IsWindowVisible, SHOW_WINDOW_CMD, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE, SetForegroundWindow,
    SetWindowPlacement, WINDOWPLACEMENT, WINDOWPLACEMENT_FLAGS, WS_EX_APPWINDOW, WS_EX_TOOLWINDOW,
};
use windows::core::{BOOL, PWSTR};

use crate::error::PlatformError;
use crate::geometry::{Monitor, Point, Rect};
use crate::platform::{
    ExStyle, Placement, ProcessId, ProcessInfo, ReorderBatch, ShowState, WindowId, WindowSystem,
};

pub struct Win32WindowSystem;

impl Win32WindowSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Win32WindowSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn hwnd(window: WindowId) -> HWND {
    HWND(window.0 as *mut c_void)
}

fn window_id(handle: HWND) -> WindowId {
    WindowId(handle.0 as isize)
}

fn os(call: &'static str, err: windows::core::Error) -> PlatformError {
    PlatformError::Os {
        call,
        code: err.code().0,
        message: err.message(),
    }
}

fn rect_from(rect: RECT) -> Rect {
    Rect::new(rect.left, rect.top, rect.right, rect.bottom)
}

fn rect_into(rect: Rect) -> RECT {
    RECT {
        left: rect.left,
        top: rect.top,
        right: rect.right,
        bottom: rect.bottom,
    }
}

fn point_from(point: POINT) -> Point {
    Point {
        x: point.x,
        y: point.y,
    }
}

fn point_into(point: Point) -> POINT {
    POINT {
        x: point.x,
        y: point.y,
    }
}

unsafe extern "system" fn enum_windows_cb(handle: HWND, lparam: LPARAM) -> BOOL {
    let out = unsafe { &mut *(lparam.0 as *mut Vec<WindowId>) };
    out.push(window_id(handle));
    true.into()
}

unsafe extern "system" fn enum_monitors_cb(
    monitor: HMONITOR,
    _hdc: HDC,
    _rect: *mut RECT,
    lparam: LPARAM,
) -> BOOL {
    let out = unsafe { &mut *(lparam.0 as *mut Vec<Monitor>) };
    let mut info = MONITORINFO {
        cbSize: mem::size_of::<MONITORINFO>() as u32,
        ..Default::default()
    };
    if unsafe { GetMonitorInfoW(monitor, &mut info) }.as_bool() {
        out.push(Monitor {
            bounds: rect_from(info.rcMonitor),
            work_area: rect_from(info.rcWork),
        });
    }
    true.into()
}

impl WindowSystem for Win32WindowSystem {
    fn enumerate_windows(&self) -> Result<Vec<WindowId>, PlatformError> {
        let mut windows: Vec<WindowId> = Vec::new();
        unsafe {
            EnumWindows(
                Some(enum_windows_cb),
                LPARAM(&mut windows as *mut Vec<WindowId> as isize),
            )
        }
        .map_err(|e| os("EnumWindows", e))?;
        // Enumeration yields front-to-back; callers expect bottommost first.
        windows.reverse();
        Ok(windows)
    }

    fn is_visible(&self, window: WindowId) -> bool {
        unsafe { IsWindowVisible(hwnd(window)) }.as_bool()
    }

    fn ex_style(&self, window: WindowId) -> ExStyle {
        let bits = unsafe { GetWindowLongPtrW(hwnd(window), GWL_EXSTYLE) };
        ExStyle {
            app_window: bits & WS_EX_APPWINDOW.0 as isize != 0,
            tool_window: bits & WS_EX_TOOLWINDOW.0 as isize != 0,
        }
    }

    fn root_owner(&self, window: WindowId) -> WindowId {
        let owner = unsafe { GetAncestor(hwnd(window), GA_ROOTOWNER) };
        if owner.0.is_null() {
            window
        } else {
            window_id(owner)
        }
    }

    fn last_active_popup(&self, window: WindowId) -> WindowId {
        let popup = unsafe { GetLastActivePopup(hwnd(window)) };
        if popup.0.is_null() {
            window
        } else {
            window_id(popup)
        }
    }

    fn title(&self, window: WindowId) -> String {
        let mut buf = [0u16; 512];
        let len = unsafe { GetWindowTextW(hwnd(window), &mut buf) };
        if len > 0 {
            String::from_utf16_lossy(&buf[..len as usize])
        } else {
            String::new()
        }
    }

    fn owner_pid(&self, window: WindowId) -> Option<ProcessId> {
        let mut pid = 0u32;
        let thread = unsafe { GetWindowThreadProcessId(hwnd(window), Some(&mut pid)) };
        if thread == 0 || pid == 0 {
            None
        } else {
            Some(ProcessId(pid))
        }
    }

    fn placement(&self, window: WindowId) -> Result<Placement, PlatformError> {
        let mut wp = WINDOWPLACEMENT {
            length: mem::size_of::<WINDOWPLACEMENT>() as u32,
            ..Default::default()
        };
        unsafe { GetWindowPlacement(hwnd(window), &mut wp) }
            .map_err(|e| os("GetWindowPlacement", e))?;
        Ok(Placement {
            flags: wp.flags.0,
            show_state: ShowState::from_raw(wp.showCmd.0 as u32),
            min_position: point_from(wp.ptMinPosition),
            max_position: point_from(wp.ptMaxPosition),
            normal_rect: rect_from(wp.rcNormalPosition),
        })
    }

    fn set_placement(&self, window: WindowId, placement: &Placement) -> Result<(), PlatformError> {
        let wp = WINDOWPLACEMENT {
            length: mem::size_of::<WINDOWPLACEMENT>() as u32,
            flags: WINDOWPLACEMENT_FLAGS(placement.flags),
            showCmd: SHOW_WINDOW_CMD(placement.show_state.as_raw() as i32),
            ptMinPosition: point_into(placement.min_position),
            ptMaxPosition: point_into(placement.max_position),
            rcNormalPosition: rect_into(placement.normal_rect),
        };
        unsafe { SetWindowPlacement(hwnd(window), &wp) }.map_err(|e| os("SetWindowPlacement", e))
    }

    fn frame_rect(&self, window: WindowId) -> Result<Rect, PlatformError> {
        let mut rect = RECT::default();
        unsafe { GetWindowRect(hwnd(window), &mut rect) }.map_err(|e| os("GetWindowRect", e))?;
        Ok(rect_from(rect))
    }

    fn extended_frame_rect(&self, window: WindowId) -> Option<Rect> {
        let mut rect = RECT::default();
        unsafe {
            DwmGetWindowAttribute(
                hwnd(window),
                DWMWA_EXTENDED_FRAME_BOUNDS,
                &mut rect as *mut RECT as *mut c_void,
                mem::size_of::<RECT>() as u32,
            )
        }
        .ok()
        .map(|()| rect_from(rect))
    }

    fn monitors(&self) -> Vec<Monitor> {
        let mut monitors: Vec<Monitor> = Vec::new();
        unsafe {
            let _ = EnumDisplayMonitors(
                None,
                None,
                Some(enum_monitors_cb),
                LPARAM(&mut monitors as *mut Vec<Monitor> as isize),
            );
        }
        monitors
    }

    fn processes(&self) -> Vec<ProcessInfo> {
        let mut pids = vec![0u32; 1024];
        let mut needed = 0u32;
        loop {
            let cb = (pids.len() * mem::size_of::<u32>()) as u32;
            if unsafe { EnumProcesses(pids.as_mut_ptr(), cb, &mut needed) }.is_err() {
                return Vec::new();
            }
            if needed < cb {
                break;
            }
            // Buffer filled exactly: there may be more processes.
            let len = pids.len() * 2;
            pids.resize(len, 0);
        }
        let count = needed as usize / mem::size_of::<u32>();
        pids[..count]
            .iter()
            .filter(|&&pid| pid != 0)
            .map(|&pid| {
                let pid = ProcessId(pid);
                ProcessInfo {
                    pid,
                    path: self.process_path(pid).unwrap_or_default(),
                }
            })
            .collect()
    }

    fn process_alive(&self, pid: ProcessId) -> bool {
        unsafe {
            let Ok(handle) = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid.0) else {
                return false;
            };
            let mut code = 0u32;
            let alive = GetExitCodeProcess(handle, &mut code).is_ok()
                && code == STILL_ACTIVE.0 as u32;
            let _ = CloseHandle(handle);
            alive
        }
    }

    fn process_path(&self, pid: ProcessId) -> Option<String> {
        unsafe {
            let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid.0).ok()?;
            let mut buf = vec![0u16; 1024];
            let mut len = buf.len() as u32;
            let ok = QueryFullProcessImageNameW(
                handle,
                PROCESS_NAME_WIN32,
                PWSTR(buf.as_mut_ptr()),
                &mut len,
            );
            let _ = CloseHandle(handle);
            if ok.is_ok() && len > 0 {
                Some(String::from_utf16_lossy(&buf[..len as usize]))
            } else {
                None
            }
        }
    }

    fn launch(&self, path: &str) -> Result<ProcessId, PlatformError> {
        let child = std::process::Command::new(path)
            .spawn()
            .map_err(|err| PlatformError::Launch {
                message: format!("{path}: {err}"),
            })?;
        Ok(ProcessId(child.id()))
    }

    fn foreground_window(&self) -> Option<WindowId> {
        let handle = unsafe { GetForegroundWindow() };
        if handle.0.is_null() {
            None
        } else {
            Some(window_id(handle))
        }
    }

    fn set_foreground_window(&self, window: WindowId) {
        let _ = unsafe { SetForegroundWindow(hwnd(window)) };
    }

    fn begin_reorder(&self, capacity: usize) -> Result<Box<dyn ReorderBatch + '_>, PlatformError> {
        let hdwp = unsafe { BeginDeferWindowPos(capacity as i32) }
            .map_err(|e| os("BeginDeferWindowPos", e))?;
        Ok(Box::new(Win32ReorderBatch {
            hdwp,
            windows: Vec::with_capacity(capacity),
        }))
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Deferred window-position transaction.
///
/// `place_above` only records the sequence; every native call happens at
/// commit. The native insert-after reference places a window *below* it, so
/// the replay runs front-to-back, anchoring the topmost window at `HWND_TOP`
/// and stacking each remaining window below the one before it.
struct Win32ReorderBatch {
    hdwp: HDWP,
    windows: Vec<WindowId>,
}

impl ReorderBatch for Win32ReorderBatch {
    fn place_above(
        &mut self,
        window: WindowId,
        _previous: Option<WindowId>,
    ) -> Result<(), PlatformError> {
        self.windows.push(window);
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<(), PlatformError> {
        let mut hdwp = self.hdwp;
        let mut insert_after = HWND_TOP;
        for window in self.windows.iter().rev() {
            // A failed defer destroys the transaction handle; bail without
            // ending it.
            hdwp = unsafe {
                DeferWindowPos(
                    hdwp,
                    hwnd(*window),
                    Some(insert_after),
                    0,
                    0,
                    0,
                    0,
                    SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
                )
            }
            .map_err(|e| os("DeferWindowPos", e))?;
            insert_after = hwnd(*window);
        }
        unsafe { EndDeferWindowPos(hdwp) }.map_err(|e| os("EndDeferWindowPos", e))
    }
}
