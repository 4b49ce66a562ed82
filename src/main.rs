mod constants;
mod eligibility;
mod error;
mod geometry;
mod persistence;
mod platform;
mod restore;
mod snapshot;
mod store;
mod window_state;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level as TraceLevel;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "winlayout",
    version,
    about = "Capture and restore window layouts: positions, sizes, show states and z-order"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Capture the current window layout as a new snapshot
    Capture {
        /// Snapshot name; unnamed snapshots display their capture time
        #[arg(long)]
        name: Option<String>,
    },
    /// List retained snapshots
    List,
    /// Restore a snapshot by its list index
    Restore { index: usize },
    /// Remove a snapshot by its list index
    Remove { index: usize },
}

fn main() -> Result<()> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    run(Cli::parse())
}

#[cfg(windows)]
fn run(cli: Cli) -> Result<()> {
    use anyhow::Context;
    use tracing::{info, warn};

    use platform::WindowSystem;
    use platform::win32::Win32WindowSystem;
    use restore::{Outcome, RestoreEngine};
    use snapshot::{MonitorFingerprint, Snapshot};

    let ws = Win32WindowSystem::new();

    match cli.command {
        Commands::Capture { name } => {
            let mut store = persistence::load();
            let snapshot = Snapshot::capture(&ws, true, name)?;
            info!(
                windows = snapshot.records().len(),
                name = %snapshot.display_name(),
                "captured snapshot"
            );
            store.add(snapshot);
            persistence::save(&store)?;
        }
        Commands::List => {
            let store = persistence::load();
            if store.is_empty() {
                println!("no snapshots");
                return Ok(());
            }
            let current = MonitorFingerprint::capture(&ws);
            for (index, snapshot) in store.list().iter().enumerate() {
                let changed = snapshot.fingerprint().monitor_count() > 0
                    && snapshot.fingerprint().differs_from(&current);
                println!(
                    "{index:>3}  {}  ({} windows){}",
                    snapshot.display_name(),
                    snapshot.records().len(),
                    if changed { "  [monitor setup changed]" } else { "" }
                );
            }
        }
        Commands::Restore { index } => {
            let store = persistence::load();
            let snapshot = store
                .get(index)
                .with_context(|| format!("no snapshot at index {index}"))?;

            // Whatever had focus before the restore keeps it afterwards.
            let focused = ws.foreground_window();
            let report = RestoreEngine::new(&ws).restore(snapshot)?;
            if let Some(window) = focused {
                ws.set_foreground_window(window);
            }

            info!(
                restored = report.restored(),
                failed = report.failed(),
                skipped = report.skipped(),
                reordered = report.reordered,
                "restore finished"
            );
            for entry in &report.windows {
                if let Outcome::Failed(failure) = &entry.outcome {
                    warn!(title = %entry.title, error = %failure, "window not restored");
                }
            }
            if let Some(err) = &report.reorder_error {
                warn!(error = %err, "z-order only partially restored");
            }
        }
        Commands::Remove { index } => {
            let mut store = persistence::load();
            let removed = store
                .remove(index)
                .with_context(|| format!("no snapshot at index {index}"))?;
            info!(name = %removed.display_name(), "removed snapshot");
            persistence::save(&store)?;
        }
    }
    Ok(())
}

#[cfg(not(windows))]
fn run(_cli: Cli) -> Result<()> {
    anyhow::bail!("this tool manages native windows and only runs on Windows")
}
