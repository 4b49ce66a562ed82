use serde::{Deserialize, Serialize};

/// Screen-space rectangle in pixels, left/top inclusive, right/bottom exclusive.
///
/// Matches the native window-manager convention so captured rectangles can be
/// round-tripped without conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.left + self.width() / 2,
            y: self.top + self.height() / 2,
        }
    }

    /// Area of the overlap with `other`, zero if they do not intersect.
    pub fn intersection_area(&self, other: &Rect) -> i64 {
        let w = self.right.min(other.right) - self.left.max(other.left);
        let h = self.bottom.min(other.bottom) - self.top.max(other.top);
        if w <= 0 || h <= 0 {
            0
        } else {
            w as i64 * h as i64
        }
    }
}

/// Screen-space point in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// One connected display: full bounds plus the working area (bounds minus
/// reserved system chrome).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Monitor {
    pub bounds: Rect,
    pub work_area: Rect,
}

/// Pick the monitor "nearest" to `rect`: the one with the largest overlap,
/// falling back to the smallest center-to-center distance when the rectangle
/// lies outside every monitor.
pub fn nearest_monitor<'a>(rect: &Rect, monitors: &'a [Monitor]) -> Option<&'a Monitor> {
    let best_overlap = monitors
        .iter()
        .map(|m| (m, m.bounds.intersection_area(rect)))
        .max_by_key(|(_, area)| *area);
    match best_overlap {
        Some((m, area)) if area > 0 => Some(m),
        _ => monitors.iter().min_by_key(|m| {
            let mc = m.bounds.center();
            let rc = rect.center();
            let dx = (mc.x - rc.x) as i64;
            let dy = (mc.y - rc.y) as i64;
            dx * dx + dy * dy
        }),
    }
}

/// Clamp a window into a monitor's working area.
///
/// The correction operates on the *visible* frame (the compositor-extended
/// bounds the user actually sees): its size is capped to the working area and
/// its position clamped so every edge lies inside. The result is then
/// translated back into *real* frame coordinates by preserving the per-edge
/// offsets recorded between the two frames, so decorative margins survive the
/// correction. Returns `(corrected_real, corrected_visible)`.
pub fn fit_to_work_area(real: Rect, visible: Rect, work: Rect) -> (Rect, Rect) {
    let width = visible.width().min(work.width());
    let height = visible.height().min(work.height());
    let left = visible.left.clamp(work.left, work.right - width);
    let top = visible.top.clamp(work.top, work.bottom - height);
    let corrected_visible = Rect::new(left, top, left + width, top + height);

    let corrected_real = Rect::new(
        corrected_visible.left + (real.left - visible.left),
        corrected_visible.top + (real.top - visible.top),
        corrected_visible.right + (real.right - visible.right),
        corrected_visible.bottom + (real.bottom - visible.bottom),
    );
    (corrected_real, corrected_visible)
}
