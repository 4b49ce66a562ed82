//! Application-wide constants
//!
//! Single source of truth for retry budgets, store limits and on-disk
//! locations used throughout the application.

/// Snapshot store limits
pub mod store {
    /// Maximum number of snapshots retained before the oldest are evicted
    pub const CAPACITY: usize = 20;
}

/// Restore engine retry budgets
///
/// All waits are bounded: total blocking time per window is
/// `attempts * backoff` for whichever loop applies.
pub mod restore {
    use std::time::Duration;

    /// Polls for a main window of an already-running process
    pub const REDISCOVER_ATTEMPTS: u32 = 10;

    /// Backoff between rediscovery polls
    pub const REDISCOVER_BACKOFF: Duration = Duration::from_millis(300);

    /// Polls for a main window after launching the executable ourselves
    /// (larger than rediscovery: cold starts are slow)
    pub const LAUNCH_ATTEMPTS: u32 = 40;

    /// Backoff between post-launch polls
    pub const LAUNCH_BACKOFF: Duration = Duration::from_millis(500);
}

/// On-disk locations for the retained snapshot store
pub mod config {
    /// Subdirectory under the platform config dir
    pub const APP_DIR: &str = "winlayout";

    /// Retained snapshots, in the serialized store format
    pub const SNAPSHOTS_FILE: &str = "snapshots.json";
}
