//! Change observation: re-runs a pass when watched files change.
//!
//! Debounce draining and cooperative cancellation follow the same
//! discipline as the loader's polling wait: a re-triggered pass cancels
//! the previous one's token, and cancelled work returns without side
//! effects at its next checkpoint.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use notify::{RecursiveMode, Watcher as _};

use crate::error;

/// Debounce delay between filesystem events and a re-run.
const DEBOUNCE_MS: u64 = 100;

/// Cooperative cancellation flag, checked at operation checkpoints.
/// Cloning shares the flag; cancelling one clone cancels all.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    /// The shared flag.
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, uncancelled token.
    pub fn new() -> Self {
        return Self { flag: Arc::new(AtomicBool::new(false)) };
    }

    /// Request cancellation. Observed at the next checkpoint.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
        return;
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        return self.flag.load(Ordering::Relaxed);
    }
}

/// Create a filesystem watcher that sends events on the given channel.
///
/// # Errors
///
/// Returns `Error::WatchFailed` if the watcher cannot be created.
fn create_watcher(
    tx: crossbeam_channel::Sender<()>,
) -> Result<notify::RecommendedWatcher, error::Error> {
    return notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res
            && matches!(
                event.kind,
                notify::EventKind::Create(_)
                    | notify::EventKind::Modify(_)
                    | notify::EventKind::Remove(_)
            )
        {
            let _ = tx.send(());
        }
    })
    .map_err(|e| {
        return error::Error::WatchFailed {
            reason: format!("watcher setup failed: {e}"),
        };
    });
}

/// Watch the given directories and re-run `pass` on each debounced batch
/// of changes. The most recent trigger is authoritative: the previous
/// pass's token is cancelled before the new pass starts, so a stale pass
/// observing its token returns without mutating shared state. Runs until
/// the event channel closes.
///
/// # Errors
///
/// Returns `Error::WatchFailed` if the watcher cannot be created.
pub fn watch_and_rerun(
    dirs: &[PathBuf],
    mut pass: impl FnMut(&CancelToken),
) -> Result<(), error::Error> {
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = create_watcher(tx)?;

    let mut watched = 0_usize;
    for dir in dirs {
        if dir.exists() && watcher.watch(dir, RecursiveMode::Recursive).is_ok() {
            watched = watched.saturating_add(1);
        }
    }
    eprintln!("watch: monitoring {watched} directories, press Ctrl+C to stop");

    let mut current = CancelToken::new();
    while rx.recv().is_ok() {
        let debounce = Duration::from_millis(DEBOUNCE_MS);
        while rx.recv_timeout(debounce).is_ok() {}

        current.cancel();
        current = CancelToken::new();
        eprintln!("watch: change detected, re-running...");
        pass(&current);
    }

    return Ok(());
}

#[cfg(test)]
mod tests {
    use super::CancelToken;

    #[test]
    fn token_starts_uncancelled() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn cancel_is_visible_through_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
