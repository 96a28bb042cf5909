//! File system watcher for live re-parsing.
//!
//! Watches one outline file and reports when it changed on disk. The caller
//! re-reads and re-parses the file and replaces its forest wholesale.
//!
//! The watch is placed on the file's directory rather than the file itself:
//! atomic saves replace the file with a new inode, which a per-file watch
//! stops seeing.

use notify::{
    Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
    event::{AccessKind, AccessMode, ModifyKind},
};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::time::{Duration, Instant};

/// Default interval during which repeated change events collapse into one.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Watches a single file for modifications.
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    receiver: Receiver<Result<Event, notify::Error>>,
    current_path: Option<PathBuf>,
    watched_dir: Option<PathBuf>,
    /// A relevant event arrived that has not been reported yet
    pending: bool,
    /// At most one change is reported per debounce interval
    last_reload: Instant,
    debounce_duration: Duration,
}

impl FileWatcher {
    pub fn new() -> Result<Self, notify::Error> {
        Self::with_debounce(DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(debounce_duration: Duration) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let watcher = notify::recommended_watcher(tx)?;

        Ok(Self {
            watcher,
            receiver: rx,
            current_path: None,
            watched_dir: None,
            pending: false,
            last_reload: Instant::now(),
            debounce_duration,
        })
    }

    /// Start watching a file. Stops watching any previously watched file.
    ///
    /// The path is canonicalized, so the file must exist.
    pub fn watch(&mut self, path: &Path) -> Result<(), notify::Error> {
        self.unwatch();

        let path = path.canonicalize().map_err(notify::Error::io)?;
        let dir = match path.parent() {
            Some(dir) => dir.to_path_buf(),
            None => path.clone(),
        };

        self.watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::debug!(path = %path.display(), dir = %dir.display(), "watching file");

        self.current_path = Some(path);
        self.watched_dir = Some(dir);
        self.pending = false;
        self.last_reload = Instant::now();
        Ok(())
    }

    pub fn unwatch(&mut self) {
        if let Some(ref dir) = self.watched_dir {
            let _ = self.watcher.unwatch(dir);
        }
        self.watched_dir = None;
        self.current_path = None;
        self.pending = false;
    }

    /// Drain pending events. Returns true if a reload should happen now.
    ///
    /// A change seen inside the debounce interval stays pending and is
    /// reported by a later call once the interval has passed.
    pub fn check_for_changes(&mut self) -> bool {
        self.drain_events();
        self.take_pending()
    }

    /// Block up to `timeout` for the next relevant change.
    ///
    /// Returns true when a debounced change is ready, false on timeout.
    pub fn wait_for_change(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;

        loop {
            if self.check_for_changes() {
                return true;
            }

            let now = Instant::now();
            if now >= deadline {
                return false;
            }

            let mut wait = deadline - now;
            if self.pending {
                wait = wait.min(self.debounce_remaining());
            }

            match self.receiver.recv_timeout(wait) {
                Ok(Ok(event)) => {
                    if self.is_relevant_event(&event) {
                        self.pending = true;
                    }
                }
                Ok(Err(e)) => tracing::warn!(error = %e, "watch error"),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return self.check_for_changes(),
            }
        }
    }

    /// Mark that a reload just happened, e.g. after writing the file
    /// ourselves. Changes already received are dropped.
    pub fn mark_reloaded(&mut self) {
        self.drain_events();
        self.pending = false;
        self.last_reload = Instant::now();
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    /// Read every queued event without blocking, recording relevant ones as
    /// pending. Never touches the debounce clock.
    fn drain_events(&mut self) {
        loop {
            match self.receiver.try_recv() {
                Ok(Ok(event)) => {
                    if self.is_relevant_event(&event) {
                        self.pending = true;
                    }
                }
                Ok(Err(e)) => tracing::warn!(error = %e, "watch error"),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    /// Report the pending change if the debounce interval has passed.
    fn take_pending(&mut self) -> bool {
        if !self.pending || !self.debounce_remaining().is_zero() {
            return false;
        }
        self.pending = false;
        self.last_reload = Instant::now();
        true
    }

    fn debounce_remaining(&self) -> Duration {
        self.debounce_duration.saturating_sub(self.last_reload.elapsed())
    }

    fn is_relevant_event(&self, event: &Event) -> bool {
        let Some(ref watched_path) = self.current_path else {
            return false;
        };
        if !event.paths.iter().any(|p| p == watched_path) {
            return false;
        }

        matches!(
            event.kind,
            EventKind::Modify(ModifyKind::Data(_))
                | EventKind::Modify(ModifyKind::Any)
                | EventKind::Modify(ModifyKind::Name(_))
                | EventKind::Access(AccessKind::Close(AccessMode::Write))
                | EventKind::Create(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FsStore, OutlineStore};
    use notify::event::{CreateKind, DataChange, RemoveKind, RenameMode};
    use std::fs;

    const SETTLE: Duration = Duration::from_secs(5);

    fn event(kind: EventKind, path: &Path) -> Event {
        Event::new(kind).add_path(path.to_path_buf())
    }

    fn watched_file(debounce: Duration) -> (tempfile::TempDir, PathBuf, FileWatcher) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.mgtree");
        fs::write(&path, "a\n").unwrap();

        let mut watcher = FileWatcher::with_debounce(debounce).unwrap();
        watcher.watch(&path).unwrap();
        (dir, path, watcher)
    }

    fn poll_for_change(watcher: &mut FileWatcher) -> bool {
        let deadline = Instant::now() + SETTLE;
        while Instant::now() < deadline {
            if watcher.check_for_changes() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        false
    }

    #[test]
    fn test_watcher_creation() {
        assert!(FileWatcher::new().is_ok());
    }

    #[test]
    fn test_watch_sets_current_path() {
        let (_dir, path, mut watcher) = watched_file(DEFAULT_DEBOUNCE);
        let canonical = path.canonicalize().unwrap();
        assert_eq!(watcher.current_path(), Some(canonical.as_path()));

        watcher.unwatch();
        assert_eq!(watcher.current_path(), None);
    }

    #[test]
    fn test_watch_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = FileWatcher::new().unwrap();
        assert!(watcher.watch(&dir.path().join("missing.mgtree")).is_err());
    }

    #[test]
    fn test_relevant_events() {
        let (_dir, path, mut watcher) = watched_file(DEFAULT_DEBOUNCE);
        let path = path.canonicalize().unwrap();
        let other = path.with_file_name("other.mgtree");

        assert!(watcher.is_relevant_event(&event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &path
        )));
        assert!(watcher.is_relevant_event(&event(
            EventKind::Create(CreateKind::File),
            &path
        )));
        assert!(watcher.is_relevant_event(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::To)),
            &path
        )));
        assert!(!watcher.is_relevant_event(&event(
            EventKind::Remove(RemoveKind::File),
            &path
        )));
        assert!(!watcher.is_relevant_event(&event(
            EventKind::Modify(ModifyKind::Any),
            &other
        )));

        watcher.unwatch();
        assert!(!watcher.is_relevant_event(&event(
            EventKind::Modify(ModifyKind::Any),
            &path
        )));
    }

    #[test]
    fn test_no_changes_without_events() {
        let mut watcher = FileWatcher::with_debounce(Duration::ZERO).unwrap();
        assert!(!watcher.check_for_changes());
        assert!(!watcher.wait_for_change(Duration::from_millis(10)));
    }

    #[test]
    fn test_plain_write_is_reported_by_wait() {
        let (_dir, path, mut watcher) = watched_file(Duration::ZERO);
        fs::write(&path, "b\n").unwrap();
        assert!(watcher.wait_for_change(SETTLE));
    }

    #[test]
    fn test_plain_write_is_reported_by_check() {
        let (_dir, path, mut watcher) = watched_file(Duration::ZERO);
        fs::write(&path, "b\n").unwrap();
        assert!(poll_for_change(&mut watcher));
    }

    #[test]
    fn test_atomic_replace_is_reported_and_watch_survives() {
        let (_dir, path, mut watcher) = watched_file(Duration::ZERO);

        FsStore.write(&path, "b\n").unwrap();
        assert!(watcher.wait_for_change(SETTLE));

        // Drain the tail of the first save before the second one
        std::thread::sleep(Duration::from_millis(100));
        watcher.mark_reloaded();

        FsStore.write(&path, "c\n").unwrap();
        assert!(poll_for_change(&mut watcher));

        fs::write(&path, "d\n").unwrap();
        assert!(watcher.wait_for_change(SETTLE));
    }

    #[test]
    fn test_change_inside_debounce_is_deferred_not_lost() {
        let (_dir, path, mut watcher) = watched_file(Duration::from_millis(300));
        fs::write(&path, "b\n").unwrap();

        assert!(!watcher.check_for_changes());
        assert!(watcher.wait_for_change(SETTLE));
    }

    #[test]
    fn test_burst_is_reported_once() {
        let (_dir, path, mut watcher) = watched_file(Duration::from_millis(200));
        fs::write(&path, "b\n").unwrap();
        fs::write(&path, "c\n").unwrap();

        assert!(watcher.wait_for_change(SETTLE));
        assert!(!watcher.wait_for_change(Duration::from_millis(50)));
    }

    #[test]
    fn test_other_files_in_directory_are_ignored() {
        let (dir, _path, mut watcher) = watched_file(Duration::ZERO);
        fs::write(dir.path().join("other.mgtree"), "x\n").unwrap();
        assert!(!watcher.wait_for_change(Duration::from_millis(300)));
    }
}
