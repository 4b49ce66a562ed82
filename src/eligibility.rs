//! Window eligibility classifier
//!
//! Decides whether a window is an independent, user-switchable top-level
//! window worth snapshotting, mirroring the platform's alt-tab heuristics.

use crate::platform::{WindowId, WindowSystem};

/// Pure query, no side effects beyond OS reads.
///
/// Rules, in order:
/// 1. invisible windows are never eligible;
/// 2. the app-window extended style bit forces eligibility;
/// 3. otherwise the tool-window bit excludes;
/// 4. otherwise walk to the root owner and chase last-active popups until
///    one is visible or the chain stops moving; the window is eligible only
///    if that fixed point is the window itself. This filters out windows
///    owned by, or superseded by, another visible window.
pub fn is_eligible<S: WindowSystem + ?Sized>(ws: &S, window: WindowId) -> bool {
    if !ws.is_visible(window) {
        return false;
    }
    let style = ws.ex_style(window);
    if style.app_window {
        return true;
    }
    if style.tool_window {
        return false;
    }

    let mut walk = ws.root_owner(window);
    loop {
        let popup = ws.last_active_popup(walk);
        // `popup == walk` guards termination: no further popup exists
        if popup == walk {
            break;
        }
        walk = popup;
        if ws.is_visible(walk) {
            break;
        }
    }
    walk == window
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ExStyle;
    use crate::platform::fake::{FakeWindowSystem, WindowSpec};

    #[test]
    fn invisible_window_is_not_eligible() {
        let ws = FakeWindowSystem::new();
        let w = ws.add_window(WindowSpec {
            visible: false,
            ..Default::default()
        });
        assert!(!is_eligible(&ws, w));
    }

    #[test]
    fn app_window_bit_wins_over_tool_window_bit() {
        let ws = FakeWindowSystem::new();
        let w = ws.add_window(WindowSpec {
            ex_style: ExStyle {
                app_window: true,
                tool_window: true,
            },
            ..Default::default()
        });
        assert!(is_eligible(&ws, w));
    }

    #[test]
    fn tool_window_is_not_eligible() {
        let ws = FakeWindowSystem::new();
        let w = ws.add_window(WindowSpec {
            ex_style: ExStyle {
                app_window: false,
                tool_window: true,
            },
            ..Default::default()
        });
        assert!(!is_eligible(&ws, w));
    }

    #[test]
    fn plain_unowned_window_is_eligible() {
        let ws = FakeWindowSystem::new();
        let w = ws.add_window(WindowSpec::default());
        assert!(is_eligible(&ws, w));
    }

    #[test]
    fn window_superseded_by_visible_popup_is_not_eligible() {
        let ws = FakeWindowSystem::new();
        let popup = ws.add_window(WindowSpec::default());
        // The walk from `superseded` ends at the visible popup, not at itself
        let superseded = ws.add_window(WindowSpec {
            last_active_popup: Some(popup),
            ..Default::default()
        });
        assert!(!is_eligible(&ws, superseded));
    }

    #[test]
    fn owned_window_is_not_eligible_when_owner_chain_leads_elsewhere() {
        let ws = FakeWindowSystem::new();
        let owner = ws.add_window(WindowSpec::default());
        let owned = ws.add_window(WindowSpec {
            owner: Some(owner),
            ..Default::default()
        });
        // Root owner of `owned` is `owner`, whose popup chain terminates at
        // `owner` itself, not at `owned`.
        assert!(!is_eligible(&ws, owned));
        assert!(is_eligible(&ws, owner));
    }

    #[test]
    fn chain_of_invisible_popups_terminates_at_fixed_point() {
        let ws = FakeWindowSystem::new();
        let hidden_popup = ws.add_window(WindowSpec {
            visible: false,
            ..Default::default()
        });
        // w's chain goes to an invisible popup whose own popup is itself;
        // the walk must stop there instead of looping.
        let w = ws.add_window(WindowSpec {
            last_active_popup: Some(hidden_popup),
            ..Default::default()
        });
        assert!(!is_eligible(&ws, w));
    }
}
