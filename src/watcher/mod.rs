pub mod debounce;
pub mod event;

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use debounce::Debouncer;
use event::{ChangeEvent, Signal};

/// Setup failures. Once a `FileWatcher` exists, errors travel on `WatchStreams::errors`.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to resolve {}: {source}", .path.display())]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create watcher: {0}")]
    Create(#[source] notify::Error),
    #[error("failed to watch directory {}: {source}", .dir.display())]
    WatchDir {
        dir: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Receiving ends of a running watcher.
pub struct WatchStreams {
    /// One event per settled save.
    pub changes: mpsc::Receiver<ChangeEvent>,
    /// Backend errors after setup. These never stop the watcher.
    pub errors: mpsc::Receiver<notify::Error>,
}

/// Watches a single file through its parent directory.
///
/// Editors that save atomically write a temporary file and rename it over the
/// target, which replaces the inode. Watching the directory and filtering by base
/// name keeps events flowing across such saves.
pub struct FileWatcher {
    path: PathBuf,
    /// Dropping the OS watcher releases the inotify/kqueue/FSEvents handle
    /// and closes the raw signal channel.
    os_watcher: Option<RecommendedWatcher>,
    debounce_task: Option<JoinHandle<()>>,
    live: Arc<AtomicBool>,
}

impl FileWatcher {
    /// Start watching `path`, coalescing raw events over `interval`.
    ///
    /// Must be called from within a Tokio runtime: the debouncer runs as a
    /// spawned task.
    pub fn start(path: &Path, interval: Duration) -> Result<(Self, WatchStreams), WatchError> {
        if !path.exists() {
            return Err(WatchError::NotFound(path.to_path_buf()));
        }
        let path = std::path::absolute(path).map_err(|source| WatchError::Resolve {
            path: path.to_path_buf(),
            source,
        })?;
        let (dir, file_name) = split_target(&path)?;

        let (raw_tx, raw_rx) = mpsc::unbounded_channel::<Signal>();
        let target_name = file_name.clone();
        let mut os_watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let signal = match res {
                Ok(ev) => {
                    if !event::is_modification(&ev.kind, &ev.paths, &target_name) {
                        return;
                    }
                    tracing::trace!(kind = ?ev.kind, paths = ?ev.paths, "raw change");
                    Signal::Modified
                }
                Err(err) => Signal::Failed(err),
            };
            // Receiver gone means the debouncer stopped; nothing left to notify.
            let _ = raw_tx.send(signal);
        })
        .map_err(WatchError::Create)?;

        // On failure `os_watcher` is dropped here, releasing the OS handle.
        os_watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::WatchDir {
                dir: dir.clone(),
                source,
            })?;

        let (changes_tx, changes_rx) = mpsc::channel(1);
        let (errors_tx, errors_rx) = mpsc::channel(16);
        let live = Arc::new(AtomicBool::new(true));
        let debouncer = Debouncer::new(interval, Arc::clone(&live));
        let debounce_task = tokio::spawn(debouncer.run(raw_rx, changes_tx, errors_tx));

        tracing::debug!(
            dir = %dir.display(),
            file = ?file_name,
            interval_ms = interval.as_millis() as u64,
            "watching directory"
        );

        Ok((
            Self {
                path,
                os_watcher: Some(os_watcher),
                debounce_task: Some(debounce_task),
                live,
            },
            WatchStreams {
                changes: changes_rx,
                errors: errors_rx,
            },
        ))
    }

    /// Absolute path of the watched file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Stop watching. Idempotent; also runs on drop.
    ///
    /// Marks the session closed before anything else so a debounce timer that is
    /// about to fire cannot deliver, then releases the OS watch and stops the
    /// debouncer task.
    pub fn shutdown(&mut self) {
        if !self.live.swap(false, Ordering::AcqRel) {
            return;
        }
        drop(self.os_watcher.take());
        if let Some(task) = self.debounce_task.take() {
            task.abort();
        }
        tracing::debug!(path = %self.path.display(), "watcher stopped");
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn split_target(path: &Path) -> Result<(PathBuf, OsString), WatchError> {
    match (path.parent(), path.file_name()) {
        (Some(dir), Some(name)) => Ok((dir.to_path_buf(), name.to_os_string())),
        _ => Err(WatchError::NotFound(path.to_path_buf())),
    }
}
